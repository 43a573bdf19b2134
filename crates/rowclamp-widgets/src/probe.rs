#![forbid(unsafe_code)]

//! Host measurement contract.
//!
//! A [`LayoutProbe`] is the box a truncation widget renders into. Writing
//! content and reading its height are separate steps: the height reported by
//! [`LayoutProbe::box_height`] is only meaningful once the host has run a
//! layout pass after the last [`LayoutProbe::commit`]. Every measurement the
//! engine asks for is therefore tagged with a [`Ticket`] so a reading that
//! arrives after a reset can be recognised and dropped.
//!
//! Hosts that can force layout on demand also implement [`SyncLayout`], which
//! enables the one-shot helpers [`measure_line_height`] and
//! [`measure_box_height`].

use std::fmt;

/// A box the host can render text into and measure.
pub trait LayoutProbe {
    /// Whether the box is mounted and can be measured.
    fn is_attached(&self) -> bool;

    /// Replace the box content. Layout happens later, on the host's schedule.
    fn commit(&mut self, content: &str);

    /// Rendered height of the box after the most recent layout pass.
    ///
    /// `None` when no layout has happened since the last commit or the box
    /// cannot be measured.
    fn box_height(&self) -> Option<f32>;

    /// Current content width of the box, if known.
    fn box_width(&self) -> Option<f32>;
}

/// A probe whose host can run layout synchronously.
pub trait SyncLayout: LayoutProbe {
    /// Run a layout pass over the committed content now.
    fn force_layout(&mut self);
}

/// Measure the height of one line by rendering `placeholder`.
///
/// Returns `None` if the box is detached or reports a non-positive height.
pub fn measure_line_height<P: SyncLayout + ?Sized>(probe: &mut P, placeholder: &str) -> Option<f32> {
    measure_box_height(probe, placeholder).filter(|h| *h > 0.0)
}

/// Commit `candidate`, lay it out, and read back the box height.
///
/// Returns `None` if the box is detached or the host cannot measure it.
pub fn measure_box_height<P: SyncLayout + ?Sized>(probe: &mut P, candidate: &str) -> Option<f32> {
    if !probe.is_attached() {
        return None;
    }
    probe.commit(candidate);
    probe.force_layout();
    probe.box_height().filter(|h| h.is_finite())
}

/// Search-state generation.
///
/// Bumped on every reset. Measurements tagged with an older generation are
/// stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation after this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// What an in-flight measurement is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    /// Placeholder committed to sample line height.
    LineHeight,
    /// Placeholder committed as the known-small first search step.
    Baseline,
    /// Candidate for word index `mid`.
    Candidate {
        /// Word index the candidate was built from.
        mid: usize,
    },
}

impl MeasureKind {
    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LineHeight => "line_height",
            Self::Baseline => "baseline",
            Self::Candidate { .. } => "candidate",
        }
    }
}

/// Tag attached to one in-flight measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    /// Generation the measurement belongs to.
    pub generation: Generation,
    /// What is being measured.
    pub kind: MeasureKind,
}

impl Ticket {
    /// Create a ticket.
    #[inline]
    #[must_use]
    pub const fn new(generation: Generation, kind: MeasureKind) -> Self {
        Self { generation, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LineBox {
        attached: bool,
        content: String,
        laid_out: Option<f32>,
    }

    impl LineBox {
        fn new() -> Self {
            Self {
                attached: true,
                content: String::new(),
                laid_out: None,
            }
        }
    }

    impl LayoutProbe for LineBox {
        fn is_attached(&self) -> bool {
            self.attached
        }
        fn commit(&mut self, content: &str) {
            self.content = content.to_string();
            self.laid_out = None;
        }
        fn box_height(&self) -> Option<f32> {
            self.laid_out
        }
        fn box_width(&self) -> Option<f32> {
            Some(40.0)
        }
    }

    impl SyncLayout for LineBox {
        fn force_layout(&mut self) {
            let lines = self.content.split('\n').filter(|l| !l.is_empty()).count();
            self.laid_out = Some(lines as f32 * 18.0);
        }
    }

    #[test]
    fn line_height_from_placeholder() {
        let mut probe = LineBox::new();
        assert_eq!(measure_line_height(&mut probe, "."), Some(18.0));
    }

    #[test]
    fn box_height_after_forced_layout() {
        let mut probe = LineBox::new();
        assert_eq!(measure_box_height(&mut probe, "a\nb\nc"), Some(54.0));
    }

    #[test]
    fn detached_probe_is_unmeasurable() {
        let mut probe = LineBox::new();
        probe.attached = false;
        assert_eq!(measure_line_height(&mut probe, "."), None);
        assert_eq!(measure_box_height(&mut probe, "x"), None);
        assert!(probe.content.is_empty());
    }

    #[test]
    fn empty_placeholder_has_no_line_height() {
        let mut probe = LineBox::new();
        assert_eq!(measure_line_height(&mut probe, ""), None);
    }

    #[test]
    fn generation_ordering() {
        let g = Generation::default();
        assert!(g.next() > g);
        assert_eq!(g.next().to_string(), "g1");
    }

    #[test]
    fn measure_kind_names() {
        assert_eq!(MeasureKind::Candidate { mid: 3 }.as_str(), "candidate");
        assert_eq!(MeasureKind::LineHeight.as_str(), "line_height");
    }
}
