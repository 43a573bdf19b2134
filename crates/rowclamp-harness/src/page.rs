#![forbid(unsafe_code)]

//! A page of independent truncated boxes.
//!
//! [`Page`] owns any number of widget/box pairs and advances them together,
//! one layout pass at a time, the way a host would after each frame. Every
//! slot keeps its own generation, search, and coalescer; nothing is shared
//! between slots.

use rowclamp_core::TruncateConfig;
use rowclamp_widgets::{LayoutPass, TruncateProps, TruncatedText};

use crate::HarnessError;
use crate::headless::{FontMetrics, HeadlessBox};

/// Handle to one slot of a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    /// Position of the slot on the page.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A widget and the box it renders into.
#[derive(Debug, Clone)]
pub struct Slot {
    /// The truncation widget.
    pub widget: TruncatedText,
    /// Its layout host.
    pub host: HeadlessBox,
}

/// What one layout pass did across the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Slots that committed a measurement string.
    pub proposed: usize,
    /// Slots that committed their final string.
    pub committed: usize,
    /// Slots that could not be measured.
    pub deferred: usize,
    /// Slots with nothing to do.
    pub idle: usize,
}

impl PassSummary {
    /// True when no slot did any work.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.proposed == 0 && self.committed == 0 && self.deferred == 0
    }
}

/// Independent truncated boxes sharing a font and configuration.
#[derive(Debug, Clone)]
pub struct Page {
    metrics: FontMetrics,
    config: TruncateConfig,
    slots: Vec<Slot>,
    passes: usize,
}

impl Page {
    /// Create an empty page.
    #[must_use]
    pub fn new(metrics: FontMetrics) -> Self {
        Self::with_config(metrics, TruncateConfig::default())
    }

    /// Create an empty page whose widgets use `config`.
    #[must_use]
    pub fn with_config(metrics: FontMetrics, config: TruncateConfig) -> Self {
        Self {
            metrics,
            config,
            slots: Vec::new(),
            passes: 0,
        }
    }

    /// Add a box `width_px` wide showing `props`.
    pub fn add(&mut self, props: TruncateProps, width_px: f32) -> SlotId {
        let id = SlotId(self.slots.len());
        self.slots.push(Slot {
            widget: TruncatedText::with_config(props, self.config.clone()),
            host: HeadlessBox::new(width_px, self.metrics),
        });
        id
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the page has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Borrow a slot.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from another page.
    #[must_use]
    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.0]
    }

    /// Mutably borrow a slot.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from another page.
    pub fn slot_mut(&mut self, id: SlotId) -> &mut Slot {
        &mut self.slots[id.0]
    }

    /// The widget in a slot.
    #[must_use]
    pub fn widget(&self, id: SlotId) -> &TruncatedText {
        &self.slot(id).widget
    }

    /// Mutable access to the widget in a slot.
    pub fn widget_mut(&mut self, id: SlotId) -> &mut TruncatedText {
        &mut self.slot_mut(id).widget
    }

    /// Current output of a slot.
    #[must_use]
    pub fn output(&self, id: SlotId) -> &str {
        self.widget(id).output()
    }

    /// Outputs of every slot, in order.
    #[must_use]
    pub fn outputs(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.widget.output()).collect()
    }

    /// Iterate over slot handles.
    pub fn ids(&self) -> impl Iterator<Item = SlotId> + use<> {
        (0..self.slots.len()).map(SlotId)
    }

    /// Resize one box. The widget sees the change on its next pass.
    pub fn resize(&mut self, id: SlotId, width_px: f32) {
        let slot = self.slot_mut(id);
        slot.host.set_width(width_px);
        slot.widget.on_resize(width_px);
    }

    /// Resize every box.
    pub fn resize_all(&mut self, width_px: f32) {
        for slot in &mut self.slots {
            slot.host.set_width(width_px);
            slot.widget.on_resize(width_px);
        }
    }

    /// Run one layout pass over every slot.
    ///
    /// Each widget reads the height of the previous layout and commits its
    /// next string; then each box lays out what was committed.
    pub fn layout_pass(&mut self) -> PassSummary {
        let mut summary = PassSummary::default();
        for slot in &mut self.slots {
            match slot.widget.after_layout(&mut slot.host) {
                LayoutPass::Proposed => summary.proposed += 1,
                LayoutPass::Committed => summary.committed += 1,
                LayoutPass::Deferred => summary.deferred += 1,
                LayoutPass::Idle => summary.idle += 1,
            }
            slot.host.layout();
        }
        self.passes += 1;
        tracing::trace!(
            pass = self.passes,
            proposed = summary.proposed,
            committed = summary.committed,
            deferred = summary.deferred,
            "page layout pass"
        );
        summary
    }

    /// Run passes until every slot is settled and a pass does no work.
    ///
    /// Returns the number of passes run.
    pub fn run_until_settled(&mut self, max_passes: usize) -> Result<usize, HarnessError> {
        for pass in 1..=max_passes {
            let summary = self.layout_pass();
            if summary.is_quiet() && self.is_settled() {
                tracing::debug!(passes = pass, slots = self.slots.len(), "page settled");
                return Ok(pass);
            }
        }
        Err(HarnessError::NotSettled {
            passes: max_passes,
        })
    }

    /// True when every widget has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.widget.is_settled() && s.widget.in_flight().is_none())
    }

    /// Total passes run.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.passes
    }
}
