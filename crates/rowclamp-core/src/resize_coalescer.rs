#![forbid(unsafe_code)]

//! Width-change coalescing for measured boxes.
//!
//! Resize notifications can arrive in storms, and some hosts deliver them in
//! the middle of a layout pass. Restarting a fit search once per notification
//! would waste a measurement cycle on every intermediate width, so widths are
//! buffered here and drained once per layout pass.
//!
//! The coalescer uses a "latest wins" strategy: only the most recent width
//! pushed before [`ResizeCoalescer::take`] is returned. The caller decides
//! whether that width actually differs from the one it is laid out against.
//!
//! # Usage
//!
//! ```
//! use rowclamp_core::resize_coalescer::ResizeCoalescer;
//!
//! let mut coalescer = ResizeCoalescer::new();
//! coalescer.push(320.0);
//! coalescer.push(300.0);
//! coalescer.push(280.0);
//!
//! // Drained once per layout pass: one width, three notifications.
//! assert_eq!(coalescer.take(), Some(280.0));
//! assert_eq!(coalescer.take(), None);
//! assert_eq!(coalescer.coalesced_total(), 2);
//! ```

/// Coalesces width notifications into at most one per layout pass.
///
/// # Thread Safety
///
/// Not thread-safe; owned by the single widget that observes its box.
///
/// # Performance
///
/// All operations are O(1). At most one width is pending.
#[derive(Debug, Clone, Default)]
pub struct ResizeCoalescer {
    /// Latest width seen since the last drain.
    pending: Option<f32>,
    /// Notifications folded into the current pending width.
    pending_count: u32,
    /// Notifications dropped in favour of a later width, over the lifetime.
    coalesced_total: u64,
    /// Drains that produced a width.
    applied_total: u64,
}

impl ResizeCoalescer {
    /// Create an empty coalescer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a width notification.
    ///
    /// Non-finite widths are ignored. Negative widths are clamped to zero.
    pub fn push(&mut self, width: f32) {
        if !width.is_finite() {
            crate::trace!(width, "ignoring non-finite resize notification");
            return;
        }
        if self.pending.is_some() {
            self.coalesced_total = self.coalesced_total.saturating_add(1);
        }
        self.pending = Some(width.max(0.0));
        self.pending_count = self.pending_count.saturating_add(1);
    }

    /// Drain the pending width, if any.
    ///
    /// Call exactly once per layout pass.
    #[must_use]
    pub fn take(&mut self) -> Option<f32> {
        let width = self.pending.take()?;
        crate::trace!(width, folded = self.pending_count, "resize drained");
        self.pending_count = 0;
        self.applied_total = self.applied_total.saturating_add(1);
        Some(width)
    }

    /// Check whether a width is waiting to be drained.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of notifications folded into the pending width.
    ///
    /// Returns 0 if nothing is pending.
    #[must_use]
    pub fn pending_count(&self) -> u32 {
        self.pending_count
    }

    /// Total notifications superseded by a later one before being drained.
    #[must_use]
    pub fn coalesced_total(&self) -> u64 {
        self.coalesced_total
    }

    /// Total drains that yielded a width.
    #[must_use]
    pub fn applied_total(&self) -> u64 {
        self.applied_total
    }

    /// Drop the pending width without applying it.
    pub fn clear(&mut self) {
        self.pending = None;
        self.pending_count = 0;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn burst_drains_to_last_width(widths in proptest::collection::vec(0.0f32..4000.0, 1..64)) {
            let mut coalescer = ResizeCoalescer::new();
            for &w in &widths {
                coalescer.push(w);
            }
            prop_assert_eq!(coalescer.take(), widths.last().copied());
            prop_assert_eq!(coalescer.take(), None);
            prop_assert_eq!(coalescer.coalesced_total(), widths.len() as u64 - 1);
        }
    }
}
