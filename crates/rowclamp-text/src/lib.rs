#![forbid(unsafe_code)]

//! Text handling for rowclamp.
//!
//! - [`WordSeq`] - whitespace-tokenized source text and candidate prefixes
//! - [`wrap_text`] - cell-width-aware word wrapping for headless layout
//!
//! # Example
//! ```
//! use rowclamp_text::{WordSeq, WrapMode, wrap_text};
//!
//! let words = WordSeq::new("the quick brown fox");
//! assert_eq!(words.len(), 4);
//! assert_eq!(words.candidate(2, "…"), "the quick…");
//! assert_eq!(words.candidate(3, "…"), "the quick brown fox");
//!
//! let lines = wrap_text("the quick brown fox", 10, WrapMode::Word);
//! assert_eq!(lines, vec!["the quick", "brown fox"]);
//! ```

pub mod words;
pub mod wrap;

pub use words::WordSeq;
pub use wrap::{WrapMode, line_count, wrap_text};
