#![forbid(unsafe_code)]

//! Whitespace tokenization and candidate prefixes.
//!
//! A [`WordSeq`] owns the source text together with the byte spans of its
//! whitespace-separated words. Candidates are addressed by a word index
//! `mid` in `[0, len - 1]`:
//!
//! | `mid` | Candidate |
//! |-------|-----------|
//! | `>= len - 1` | the source text, verbatim |
//! | `0` | the empty string |
//! | otherwise | the first `mid` words joined by single spaces, then the ellipsis |
//!
//! The source is never rewritten; candidates are computed views.

use std::borrow::Cow;

use smallvec::SmallVec;

/// Source text tokenized into words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordSeq {
    source: String,
    spans: SmallVec<[(usize, usize); 32]>,
}

impl WordSeq {
    /// Tokenize `text` on Unicode whitespace.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let source = text.into();
        let spans = split_spans(&source);
        Self { source, spans }
    }

    /// The untouched source text.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of words.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True when the text has no words (empty or all whitespace).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Highest meaningful search index, `len - 1` (0 when empty).
    #[inline]
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.spans.len().saturating_sub(1)
    }

    /// The word at `index`.
    #[must_use]
    pub fn word(&self, index: usize) -> Option<&str> {
        self.spans
            .get(index)
            .map(|&(start, end)| &self.source[start..end])
    }

    /// Iterate over the words in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans
            .iter()
            .map(|&(start, end)| &self.source[start..end])
    }

    /// Whether `candidate(mid)` is the whole source text.
    #[inline]
    #[must_use]
    pub fn is_full(&self, mid: usize) -> bool {
        mid.saturating_add(1) >= self.spans.len()
    }

    /// Build the candidate string for word index `mid`.
    #[must_use]
    pub fn candidate(&self, mid: usize, ellipsis: &str) -> Cow<'_, str> {
        if self.is_full(mid) {
            return Cow::Borrowed(&self.source);
        }
        if mid == 0 {
            return Cow::Borrowed("");
        }

        let prefix_end = self.spans[mid - 1].1;
        let mut out = String::with_capacity(prefix_end + ellipsis.len());
        for (i, word) in self.iter().take(mid).enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(word);
        }
        out.push_str(ellipsis);
        Cow::Owned(out)
    }

    /// Number of source words visible in `candidate(mid)`.
    #[inline]
    #[must_use]
    pub fn candidate_word_count(&self, mid: usize) -> usize {
        if self.is_full(mid) {
            self.spans.len()
        } else {
            mid
        }
    }
}

impl From<&str> for WordSeq {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for WordSeq {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

fn split_spans(text: &str) -> SmallVec<[(usize, usize); 32]> {
    let mut spans = SmallVec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, idx));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}
