#![forbid(unsafe_code)]

//! Cell-width-aware wrapping.
//!
//! Widths are counted in terminal-style cells: grapheme clusters are never
//! split and wide characters (CJK, most emoji) take two cells. The headless
//! layout host uses [`wrap_text`] to decide how many lines a string occupies
//! in a box of a given width.
//!
//! # Example
//! ```
//! use rowclamp_text::wrap::{line_count, wrap_text, WrapMode};
//!
//! let lines = wrap_text("Hello world foo bar", 10, WrapMode::Word);
//! assert_eq!(lines, vec!["Hello", "world foo", "bar"]);
//!
//! // Overlong words stay whole unless char fallback is requested.
//! assert_eq!(line_count("Supercalifragilistic", 10, WrapMode::Word), 1);
//! assert_eq!(line_count("Supercalifragilistic", 10, WrapMode::WordChar), 2);
//! ```

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Text wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Wrap at whitespace; an overlong word keeps its own line and overflows.
    #[default]
    Word,
    /// Wrap at whitespace, breaking overlong words at grapheme boundaries.
    WordChar,
}

/// Wrap `text` into lines of at most `width` cells.
///
/// Explicit newlines start a new line. Runs of whitespace collapse into the
/// break or a single space, as in a browser's `white-space: normal`. Empty
/// text yields no lines. A zero width disables wrapping: each paragraph
/// becomes one line.
#[must_use]
pub fn wrap_text(text: &str, width: usize, mode: WrapMode) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, width, mode, &mut lines);
    }
    // A trailing run of blank paragraphs contributes nothing once collapsed.
    while lines.last().is_some_and(|l: &String| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Number of lines `text` occupies at `width` cells.
#[must_use]
pub fn line_count(text: &str, width: usize, mode: WrapMode) -> usize {
    wrap_text(text, width, mode).len()
}

fn wrap_paragraph(paragraph: &str, width: usize, mode: WrapMode, lines: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_width = 0usize;
    let mut produced = false;

    for word in paragraph.split_whitespace() {
        let word_width = word.width();
        let sep = usize::from(!current.is_empty());

        if width == 0 || current_width + sep + word_width <= width {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_width += sep + word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            produced = true;
            current_width = 0;
        }

        if word_width > width && mode == WrapMode::WordChar {
            for grapheme in word.graphemes(true) {
                let g_width = grapheme.width();
                if current_width + g_width > width && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    produced = true;
                    current_width = 0;
                }
                current.push_str(grapheme);
                current_width += g_width;
            }
        } else {
            current.push_str(word);
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    } else if !produced {
        // Blank paragraph between two newlines still occupies a line.
        lines.push(String::new());
    }
}
