#![forbid(unsafe_code)]

//! Deterministic hosts and drivers for exercising rowclamp widgets.
//!
//! - [`headless`] - a word-wrapping box on a fixed-advance font grid
//! - [`scripted`] - a box measured by an arbitrary script, for fault injection
//! - [`page`] - many independent boxes advanced one layout pass at a time
//! - [`resize_storm`] - seeded width-change storms and their replay
//!
//! # Quick Start
//!
//! ```
//! use rowclamp_harness::{FontMetrics, Page};
//! use rowclamp_widgets::TruncateProps;
//!
//! let mut page = Page::new(FontMetrics::new(8.0, 20.0));
//! let id = page.add(TruncateProps::new("one two three four five six").rows(1), 80.0);
//! page.run_until_settled(64).unwrap();
//! assert_eq!(page.output(id), "one two…");
//! ```

pub mod headless;
pub mod page;
pub mod resize_storm;
pub mod scripted;

use std::fmt;

use rowclamp_core::{ConfigError, TruncateConfig};
use rowclamp_widgets::{TruncateProps, TruncatedText};

pub use headless::{FontMetrics, HeadlessBox};
pub use page::{Page, PassSummary, Slot, SlotId};
pub use resize_storm::{
    ResizeEvent, ResizeStorm, StormConfig, StormPattern, StormReport, get_storm_seed,
};
pub use scripted::ScriptedProbe;

/// Harness failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// Widgets were still working after the pass limit.
    NotSettled {
        /// Passes run before giving up.
        passes: usize,
    },
    /// A caller-supplied value was rejected.
    InvalidArgument(String),
    /// The engine configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSettled { passes } => write!(f, "not settled after {passes} layout passes"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Config(e) => write!(f, "config error: {e}"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for HarnessError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// A single widget settled in a headless box.
#[derive(Debug, Clone)]
pub struct SettledRun {
    /// The settled widget.
    pub widget: TruncatedText,
    /// The box it rendered into.
    pub host: HeadlessBox,
    /// Layout passes it took.
    pub passes: usize,
}

/// Settle one widget in a fresh box `width_px` wide.
pub fn settle_one(
    props: TruncateProps,
    width_px: f32,
    metrics: FontMetrics,
    config: TruncateConfig,
    max_passes: usize,
) -> Result<SettledRun, HarnessError> {
    if !width_px.is_finite() || width_px < 0.0 {
        return Err(HarnessError::InvalidArgument(format!(
            "width must be a non-negative number, got {width_px}"
        )));
    }
    let config = config.validated()?;
    let mut page = Page::with_config(metrics, config);
    let id = page.add(props, width_px);
    let passes = page.run_until_settled(max_passes)?;
    let Slot { widget, host } = page.slot(id).clone();
    Ok(SettledRun {
        widget,
        host,
        passes,
    })
}
