//! Property-based invariant tests for the truncation widget.
//!
//! Driven against a word-wrapping box whose height grows monotonically with
//! candidate length:
//!
//! 1. The settled output is the source, the empty string, or a word prefix
//!    followed by the ellipsis.
//! 2. A non-empty output fits within the row budget.
//! 3. The output is maximal: the next longer candidate overflows.
//! 4. Candidate measurements per search stay within `ceil(log2(W + 1)) + 2`.
//! 5. Raising the row budget never shows fewer words.
//! 6. A settled widget is idle on further passes.

use proptest::prelude::*;
use rowclamp_text::{WordSeq, WrapMode, line_count};
use rowclamp_widgets::{LayoutPass, LayoutProbe, TruncateProps, TruncatedText};

const LINE: f32 = 20.0;

// ── Helpers ─────────────────────────────────────────────────────────────

struct WrapBox {
    cols: usize,
    content: String,
}

impl WrapBox {
    fn new(cols: usize) -> Self {
        Self {
            cols,
            content: String::new(),
        }
    }

    fn height_of(&self, text: &str) -> f32 {
        line_count(text, self.cols, WrapMode::Word) as f32 * LINE
    }
}

impl LayoutProbe for WrapBox {
    fn is_attached(&self) -> bool {
        true
    }
    fn commit(&mut self, content: &str) {
        self.content = content.to_string();
    }
    fn box_height(&self) -> Option<f32> {
        Some(self.height_of(&self.content))
    }
    fn box_width(&self) -> Option<f32> {
        Some(self.cols as f32 * 8.0)
    }
}

fn words_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,9}", 0..60).prop_map(|words| words.join(" "))
}

fn settle(text: &str, rows: u16, cols: usize) -> (TruncatedText, WrapBox) {
    let mut widget = TruncatedText::new(TruncateProps::new(text).rows(rows));
    let mut host = WrapBox::new(cols);
    for _ in 0..256 {
        widget.after_layout(&mut host);
        if widget.is_settled() && widget.in_flight().is_none() {
            widget.after_layout(&mut host);
            return (widget, host);
        }
    }
    panic!("did not settle: {text:?} rows={rows} cols={cols}");
}

fn shown_words(output: &str) -> usize {
    output.trim_end_matches('\u{2026}').split_whitespace().count()
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn output_is_a_candidate(text in words_strategy(), rows in 1u16..6, cols in 4usize..60) {
        let (widget, _) = settle(&text, rows, cols);
        let words = WordSeq::new(text.as_str());
        let output = widget.output();
        let is_candidate = output == text
            || output.is_empty()
            || (1..words.len()).any(|k| words.candidate(k, "\u{2026}") == output);
        prop_assert!(is_candidate, "{output:?} is not a candidate of {text:?}");
    }

    #[test]
    fn output_fits_and_is_maximal(text in words_strategy(), rows in 1u16..6, cols in 4usize..60) {
        let (widget, host) = settle(&text, rows, cols);
        let budget = f32::from(rows) * LINE;
        let output = widget.output();
        if !output.is_empty() {
            prop_assert!(host.height_of(output) <= budget);
        }
        let words = WordSeq::new(text.as_str());
        if output != text && !words.is_empty() {
            let next = words.candidate(shown_words(output) + 1, "\u{2026}");
            prop_assert!(
                host.height_of(&next) > budget,
                "{next:?} also fits {rows} rows at {cols} cols"
            );
        }
    }

    #[test]
    fn measurements_are_logarithmic(text in words_strategy(), rows in 1u16..6, cols in 4usize..60) {
        let (widget, _) = settle(&text, rows, cols);
        let words = WordSeq::new(text.as_str()).len();
        let bound = u64::from(usize::BITS - words.leading_zeros()) + 2;
        prop_assert!(widget.stats().candidate_measurements <= bound);
        prop_assert!(widget.stats().line_height_measurements <= 1);
    }

    #[test]
    fn more_rows_never_show_fewer_words(text in words_strategy(), rows in 1u16..5, cols in 4usize..60) {
        let (fewer, _) = settle(&text, rows, cols);
        let (more, _) = settle(&text, rows + 1, cols);
        prop_assert!(shown_words(more.output()) >= shown_words(fewer.output()));
    }

    #[test]
    fn settled_widget_stays_idle(text in words_strategy(), rows in 1u16..6, cols in 4usize..60) {
        let (mut widget, mut host) = settle(&text, rows, cols);
        let output = widget.output().to_string();
        let generation = widget.generation();
        for _ in 0..4 {
            prop_assert_eq!(widget.after_layout(&mut host), LayoutPass::Idle);
        }
        prop_assert_eq!(widget.output(), output.as_str());
        prop_assert_eq!(widget.generation(), generation);
    }
}
