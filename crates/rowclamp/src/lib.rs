#![forbid(unsafe_code)]

//! rowclamp public facade crate.
//!
//! Re-exports the engine types from the internal crates, offers a prelude,
//! and a one-call helper for hosts that can lay out synchronously.
//!
//! ```
//! use rowclamp::prelude::*;
//!
//! /// Twelve cells per 20px line, laid out on demand.
//! #[derive(Default)]
//! struct Cells {
//!     content: String,
//!     height: Option<f32>,
//! }
//!
//! impl LayoutProbe for Cells {
//!     fn is_attached(&self) -> bool { true }
//!     fn commit(&mut self, content: &str) {
//!         self.content = content.to_string();
//!         self.height = None;
//!     }
//!     fn box_height(&self) -> Option<f32> { self.height }
//!     fn box_width(&self) -> Option<f32> { Some(96.0) }
//! }
//!
//! impl SyncLayout for Cells {
//!     fn force_layout(&mut self) {
//!         self.height = Some(self.content.chars().count().div_ceil(12) as f32 * 20.0);
//!     }
//! }
//!
//! let widget = rowclamp::clamp_sync(
//!     &mut Cells::default(),
//!     TruncateProps::new("one two three four five six").rows(1),
//!     TruncateConfig::default(),
//! )?;
//! assert_eq!(widget.output(), "one two…");
//! # Ok::<(), rowclamp::Error>(())
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use rowclamp_core::{ConfigError, ResizeCoalescer, TruncateConfig};

// --- Text re-exports -------------------------------------------------------

pub use rowclamp_text::{WordSeq, WrapMode};

// --- Engine re-exports -----------------------------------------------------

pub use rowclamp_widgets::{
    Completion, FitOutcome, FitSearch, Generation, LayoutPass, LayoutProbe, MeasureKind,
    ResetReason, SearchEvent, SearchStats, Step, SyncLayout, Ticket, TruncateProps,
    TruncatedText,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for rowclamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration rejected.
    Config(ConfigError),
    /// The box is not mounted.
    Detached,
    /// The widget was still working after the pass limit.
    NotSettled {
        /// Passes run.
        passes: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Detached => write!(f, "layout box is not attached"),
            Self::NotSettled { passes } => write!(f, "not settled after {passes} layout passes"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for rowclamp APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Synchronous driver ---------------------------------------------------

/// Settle a widget against a probe that can lay out on demand.
///
/// Runs the same stepped protocol a deferred host would, forcing layout
/// after every commit. The returned widget is settled and its output has
/// been committed to `probe`.
pub fn clamp_sync<P: SyncLayout + ?Sized>(
    probe: &mut P,
    props: TruncateProps,
    config: TruncateConfig,
) -> Result<TruncatedText> {
    let config = config.validated()?;
    if !probe.is_attached() {
        return Err(Error::Detached);
    }
    // Line height, baseline, every candidate, the final commit, and slack.
    let max_passes = config.max_measurements as usize + 8;
    let mut widget = TruncatedText::with_config(props, config);
    for _ in 0..max_passes {
        let pass = widget.after_layout(probe);
        probe.force_layout();
        if pass == LayoutPass::Idle && widget.is_settled() {
            return Ok(widget);
        }
        if pass == LayoutPass::Deferred && !probe.is_attached() {
            return Err(Error::Detached);
        }
    }
    Err(Error::NotSettled { passes: max_passes })
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, FitOutcome, LayoutPass, LayoutProbe, Result, Step, SyncLayout, TruncateConfig,
        TruncateProps, TruncatedText,
    };

    pub use crate::{core, text, widgets};
}

pub use rowclamp_core as core;
pub use rowclamp_text as text;
pub use rowclamp_widgets as widgets;

#[cfg(test)]
mod tests {
    use super::*;

    struct Lines {
        attached: bool,
        per_line: usize,
        content: String,
        height: Option<f32>,
    }

    impl Lines {
        fn new(per_line: usize) -> Self {
            Self {
                attached: true,
                per_line,
                content: String::new(),
                height: None,
            }
        }
    }

    impl LayoutProbe for Lines {
        fn is_attached(&self) -> bool {
            self.attached
        }
        fn commit(&mut self, content: &str) {
            self.content = content.to_string();
            self.height = None;
        }
        fn box_height(&self) -> Option<f32> {
            self.height
        }
        fn box_width(&self) -> Option<f32> {
            Some(self.per_line as f32 * 10.0)
        }
    }

    impl SyncLayout for Lines {
        fn force_layout(&mut self) {
            let chars = self.content.chars().count();
            self.height = Some(chars.div_ceil(self.per_line) as f32 * 16.0);
        }
    }

    #[test]
    fn clamp_sync_settles_and_commits() {
        let mut probe = Lines::new(12);
        let widget = clamp_sync(
            &mut probe,
            TruncateProps::new("one two three four five six").rows(1),
            TruncateConfig::default(),
        )
        .unwrap();
        assert_eq!(widget.output(), "one two…");
        assert_eq!(probe.content, "one two…");
    }

    #[test]
    fn clamp_sync_rejects_detached_box() {
        let mut probe = Lines::new(12);
        probe.attached = false;
        let err = clamp_sync(&mut probe, TruncateProps::new("x"), TruncateConfig::default())
            .unwrap_err();
        assert_eq!(err, Error::Detached);
    }

    #[test]
    fn clamp_sync_rejects_bad_config() {
        let mut probe = Lines::new(12);
        let err = clamp_sync(
            &mut probe,
            TruncateProps::new("x"),
            TruncateConfig::default().with_placeholder(""),
        )
        .unwrap_err();
        assert_eq!(err, Error::Config(ConfigError::EmptyPlaceholder));
        assert_eq!(err.to_string(), "placeholder must not be empty");
    }
}
