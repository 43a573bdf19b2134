#![forbid(unsafe_code)]

//! Row-budget text truncation driven by measured layout.
//!
//! The engine never predicts line wrapping. It proposes a candidate string,
//! lets the host lay it out, reads back the rendered height, and narrows a
//! binary search over word prefixes until the longest prefix that fits the
//! row budget is found.
//!
//! - [`probe`] - the host contract ([`LayoutProbe`]) and measurement tickets
//! - [`fit_search`] - the pure search state machine ([`FitSearch`])
//! - [`truncated_text`] - the component that ties both to props, resets and
//!   resize notifications ([`TruncatedText`])
//!
//! # Example
//!
//! ```
//! use rowclamp_widgets::{LayoutProbe, TruncateProps, TruncatedText};
//!
//! /// A box that lays out instantly: ten characters per 20px line.
//! #[derive(Default)]
//! struct FixedBox {
//!     content: String,
//! }
//!
//! impl LayoutProbe for FixedBox {
//!     fn is_attached(&self) -> bool {
//!         true
//!     }
//!     fn commit(&mut self, content: &str) {
//!         self.content = content.to_string();
//!     }
//!     fn box_height(&self) -> Option<f32> {
//!         let chars = self.content.chars().count();
//!         Some(chars.div_ceil(10) as f32 * 20.0)
//!     }
//!     fn box_width(&self) -> Option<f32> {
//!         Some(100.0)
//!     }
//! }
//!
//! let mut widget = TruncatedText::new(TruncateProps::new("aaaa bbbb cccc dddd eeee").rows(1));
//! let mut host = FixedBox::default();
//! for _ in 0..32 {
//!     widget.after_layout(&mut host);
//! }
//! assert!(widget.is_settled());
//! assert_eq!(widget.output(), "aaaa bbbb…");
//! ```

pub mod fit_search;
pub mod probe;
pub mod truncated_text;

pub use fit_search::{Bounds, FitOutcome, FitSearch, Probe, SearchStep};
pub use probe::{
    Generation, LayoutProbe, MeasureKind, SyncLayout, Ticket, measure_box_height,
    measure_line_height,
};
pub use truncated_text::{
    Completion, LayoutPass, ResetReason, SearchEvent, SearchStats, Step, TruncateProps,
    TruncatedText,
};
