#![forbid(unsafe_code)]

//! Scripted layout host for fault injection.
//!
//! [`ScriptedProbe`] measures committed content with a caller-supplied
//! function instead of real wrapping. Tests use it to model hosts that are
//! non-monotonic, non-deterministic, or slow to lay out.

use std::fmt;

use rowclamp_widgets::{LayoutProbe, SyncLayout};

type HeightFn = Box<dyn FnMut(&str) -> f32 + Send>;

/// A box whose height comes from a script.
pub struct ScriptedProbe {
    height_fn: HeightFn,
    width_px: Option<f32>,
    attached: bool,
    content: String,
    laid_out: Option<f32>,
    lag: u32,
    pending_layouts: u32,
    log: Vec<String>,
}

impl fmt::Debug for ScriptedProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedProbe")
            .field("width_px", &self.width_px)
            .field("attached", &self.attached)
            .field("content", &self.content)
            .field("laid_out", &self.laid_out)
            .field("lag", &self.lag)
            .finish_non_exhaustive()
    }
}

impl ScriptedProbe {
    /// Create an attached probe measuring with `height_fn`.
    pub fn new(height_fn: impl FnMut(&str) -> f32 + Send + 'static) -> Self {
        Self {
            height_fn: Box::new(height_fn),
            width_px: Some(320.0),
            attached: true,
            content: String::new(),
            laid_out: None,
            lag: 0,
            pending_layouts: 0,
            log: Vec::new(),
        }
    }

    /// Require `lag` extra layout calls after each commit before a height is
    /// reported.
    #[must_use]
    pub fn with_lag(mut self, lag: u32) -> Self {
        self.lag = lag;
        self
    }

    /// Report `width_px` as the box width (`None` for unknown).
    #[must_use]
    pub fn with_width(mut self, width_px: Option<f32>) -> Self {
        self.width_px = width_px;
        self
    }

    /// Run one layout call.
    pub fn layout(&mut self) {
        if self.pending_layouts > 0 {
            self.pending_layouts -= 1;
            return;
        }
        if self.laid_out.is_none() {
            self.laid_out = Some((self.height_fn)(&self.content));
        }
    }

    /// Mount or unmount the box.
    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    /// Every string committed so far, in order.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Committed content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl LayoutProbe for ScriptedProbe {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn commit(&mut self, content: &str) {
        content.clone_into(&mut self.content);
        self.log.push(content.to_string());
        self.laid_out = None;
        self.pending_layouts = self.lag;
    }

    fn box_height(&self) -> Option<f32> {
        self.laid_out
    }

    fn box_width(&self) -> Option<f32> {
        self.width_px
    }
}

impl SyncLayout for ScriptedProbe {
    fn force_layout(&mut self) {
        self.pending_layouts = 0;
        self.layout();
    }
}
