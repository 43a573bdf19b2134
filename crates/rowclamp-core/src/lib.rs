#![forbid(unsafe_code)]

//! Core: configuration, resize coalescing, and logging shims for rowclamp.

pub mod config;
pub mod logging;
pub mod resize_coalescer;

pub use config::{ConfigError, TruncateConfig};
pub use resize_coalescer::ResizeCoalescer;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
