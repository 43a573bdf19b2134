#![forbid(unsafe_code)]

//! Deterministic headless layout host.
//!
//! [`HeadlessBox`] stands in for a rendered text box. Widths are in pixels;
//! text is wrapped by word on a fixed-advance grid derived from
//! [`FontMetrics`], and each wrapped line adds one line height. Like a real
//! host, the box only reports a height after [`HeadlessBox::layout`] has run
//! over the most recent commit.

use rowclamp_text::{WrapMode, wrap_text};
use rowclamp_widgets::{LayoutProbe, SyncLayout};

/// Fixed-advance font model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Horizontal advance of one cell, in pixels.
    pub advance_px: f32,
    /// Height of one line, in pixels.
    pub line_height_px: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            advance_px: 8.0,
            line_height_px: 20.0,
        }
    }
}

impl FontMetrics {
    /// Create font metrics.
    #[must_use]
    pub const fn new(advance_px: f32, line_height_px: f32) -> Self {
        Self {
            advance_px,
            line_height_px,
        }
    }

    /// Whole cells that fit in `width_px`.
    #[must_use]
    pub fn columns(&self, width_px: f32) -> usize {
        if self.advance_px <= 0.0 || !width_px.is_finite() || width_px <= 0.0 {
            return 0;
        }
        (width_px / self.advance_px).floor() as usize
    }
}

/// A word-wrapping box laid out on demand.
#[derive(Debug, Clone)]
pub struct HeadlessBox {
    metrics: FontMetrics,
    width_px: f32,
    attached: bool,
    content: String,
    laid_out: Option<f32>,
    commits: u64,
    layouts: u64,
}

impl HeadlessBox {
    /// Create an attached, empty box `width_px` wide.
    #[must_use]
    pub fn new(width_px: f32, metrics: FontMetrics) -> Self {
        Self {
            metrics,
            width_px,
            attached: true,
            content: String::new(),
            laid_out: None,
            commits: 0,
            layouts: 0,
        }
    }

    /// Run a layout pass over the committed content.
    ///
    /// A zero-column box still lays out; text then occupies one line per
    /// paragraph, as with wrapping disabled.
    pub fn layout(&mut self) {
        self.layouts += 1;
        self.laid_out = Some(self.height_of(&self.content));
    }

    /// Height `text` would occupy in this box.
    #[must_use]
    pub fn height_of(&self, text: &str) -> f32 {
        self.lines_of(text).len() as f32 * self.metrics.line_height_px
    }

    /// Wrapped lines of `text` in this box.
    #[must_use]
    pub fn lines_of(&self, text: &str) -> Vec<String> {
        wrap_text(text, self.metrics.columns(self.width_px), WrapMode::Word)
    }

    /// Change the box width. Invalidates the last layout.
    pub fn set_width(&mut self, width_px: f32) {
        if width_px != self.width_px {
            self.width_px = width_px;
            self.laid_out = None;
        }
    }

    /// Change the font. Invalidates the last layout.
    pub fn set_metrics(&mut self, metrics: FontMetrics) {
        self.metrics = metrics;
        self.laid_out = None;
    }

    /// Mount the box.
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Unmount the box. Heights read as unknown until it is attached again.
    pub fn detach(&mut self) {
        self.attached = false;
        self.laid_out = None;
    }

    /// Current width in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.width_px
    }

    /// Font in use.
    #[must_use]
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Committed content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of commits so far.
    #[must_use]
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Number of layout passes so far.
    #[must_use]
    pub fn layouts(&self) -> u64 {
        self.layouts
    }
}

impl LayoutProbe for HeadlessBox {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn commit(&mut self, content: &str) {
        content.clone_into(&mut self.content);
        self.laid_out = None;
        self.commits += 1;
    }

    fn box_height(&self) -> Option<f32> {
        if self.attached { self.laid_out } else { None }
    }

    fn box_width(&self) -> Option<f32> {
        self.attached.then_some(self.width_px)
    }
}

impl SyncLayout for HeadlessBox {
    fn force_layout(&mut self) {
        self.layout();
    }
}
