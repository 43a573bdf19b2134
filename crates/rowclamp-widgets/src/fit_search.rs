#![forbid(unsafe_code)]

//! Binary search over word prefixes, one measurement at a time.
//!
//! [`FitSearch`] knows nothing about hosts or strings. It is told what each
//! proposed candidate measured and answers with the next word index to try.
//! The caller turns indices into candidate strings and carries them across
//! the render/layout boundary.
//!
//! # Decision rule
//!
//! 1) The first measurement is the placeholder baseline at `mid = 0`.
//! 2) A measurement that fits the height budget moves `low` up to `mid`;
//!    one that overflows moves `high` down to `mid - 1` (never below `low`).
//! 3) The next guess is `mid = round((low + high) / 2)`, halves rounding up.
//! 4) Each guess is pushed onto a short rolling history. When the history is
//!    full and its oldest and newest entries are equal, the search stops.
//!
//! Heights are compared after rounding to whole units, so sub-pixel noise in
//! the host cannot flip a decision at the budget boundary.
//!
//! # Invariants
//!
//! - `0 <= low <= mid <= high <= last_index` after every step.
//! - `low` only ever holds an index that was measured as fitting, or the
//!   initial 0.
//! - The width of `[low, high]` never grows.
//!
//! # Termination
//!
//! While `low < high` every measurement strictly narrows the interval, so the
//! interval collapses after at most `ceil(log2(words))` candidates. Once
//! collapsed, `mid` repeats and the history guard fires within
//! `history_len - 1` further measurements. `max_measurements` is a hard stop
//! on top of that.
//!
//! # Outcomes
//!
//! The history guard is a heuristic, so the result is tagged:
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | [`FitOutcome::Converged`] | interval collapsed and every reading was consistent |
//! | [`FitOutcome::Oscillated`] | a shorter candidate overflowed after a longer or equal one fit; best effort |
//! | [`FitOutcome::Exhausted`] | measurement cap reached first; best effort |

use std::collections::VecDeque;

/// What the next measurement must be taken against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The placeholder string.
    Baseline,
    /// The candidate for a word index.
    Candidate(usize),
}

/// Result of feeding one measurement to the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    /// Measure the candidate for `mid` next.
    Continue {
        /// Next word index to try.
        mid: usize,
    },
    /// The search has stopped.
    Done(FitOutcome),
}

/// How a search ended. Every variant carries the answer index `low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    /// Bounds collapsed with consistent measurements.
    Converged {
        /// Answer word index.
        mid: usize,
    },
    /// The guard fired after inconsistent measurements.
    Oscillated {
        /// Best word index found.
        mid: usize,
    },
    /// The measurement cap was hit before the guard fired.
    Exhausted {
        /// Best word index found.
        mid: usize,
    },
}

impl FitOutcome {
    /// The answer word index.
    #[must_use]
    pub const fn mid(self) -> usize {
        match self {
            Self::Converged { mid } | Self::Oscillated { mid } | Self::Exhausted { mid } => mid,
        }
    }

    /// True only for [`FitOutcome::Converged`].
    #[must_use]
    pub const fn is_converged(self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Converged { .. } => "converged",
            Self::Oscillated { .. } => "oscillated",
            Self::Exhausted { .. } => "exhausted",
        }
    }
}

/// Snapshot of the search interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Largest index known to fit.
    pub low: usize,
    /// Index currently proposed.
    pub mid: usize,
    /// Largest index that may still fit.
    pub high: usize,
}

/// Word-prefix binary search driven by external measurements.
#[derive(Debug, Clone)]
pub struct FitSearch {
    low: usize,
    mid: usize,
    high: usize,
    budget: f32,
    history: VecDeque<usize>,
    history_len: usize,
    awaiting: Probe,
    verified: bool,
    anomaly: bool,
    measurements: u32,
    max_measurements: u32,
    outcome: Option<FitOutcome>,
}

impl FitSearch {
    /// Start a search over `word_count` words against `height_budget`.
    ///
    /// `history_len` below 2 is raised to 2; `max_measurements` of 0 is
    /// raised to 1.
    #[must_use]
    pub fn new(
        word_count: usize,
        height_budget: f32,
        history_len: usize,
        max_measurements: u32,
    ) -> Self {
        let history_len = history_len.max(2);
        Self {
            low: 0,
            mid: 0,
            high: word_count.saturating_sub(1),
            budget: height_budget.round(),
            history: VecDeque::with_capacity(history_len),
            history_len,
            awaiting: Probe::Baseline,
            verified: false,
            anomaly: false,
            measurements: 0,
            max_measurements: max_measurements.max(1),
            outcome: None,
        }
    }

    /// What the next measurement must be taken against, or `None` once done.
    #[must_use]
    pub fn next_probe(&self) -> Option<Probe> {
        if self.outcome.is_some() {
            None
        } else {
            Some(self.awaiting)
        }
    }

    /// Whether a measured height fits the budget.
    #[inline]
    #[must_use]
    pub fn fits(&self, height: f32) -> bool {
        height.is_finite() && height.round() <= self.budget
    }

    /// Feed the height measured for [`next_probe`](Self::next_probe).
    ///
    /// Once the search is done this returns the stored outcome unchanged.
    pub fn record(&mut self, height: f32) -> SearchStep {
        if let Some(outcome) = self.outcome {
            return SearchStep::Done(outcome);
        }

        let measured = self.awaiting;
        let fits = self.fits(height);
        if let Probe::Candidate(_) = measured {
            self.measurements = self.measurements.saturating_add(1);
        }

        if fits {
            self.low = self.mid;
            if let Probe::Candidate(_) = measured {
                self.verified = true;
            }
        } else {
            // The placeholder or an index already known to fit overflowed.
            if matches!(measured, Probe::Baseline) || (self.mid == self.low && self.verified) {
                self.anomaly = true;
            }
            self.high = self.mid.saturating_sub(1).max(self.low);
        }

        self.mid = (self.low + self.high).div_ceil(2);
        self.history.push_back(self.mid);
        if self.history.len() > self.history_len {
            self.history.pop_front();
        }

        tracing::trace!(
            probe = ?measured,
            height,
            budget = self.budget,
            fits,
            low = self.low,
            mid = self.mid,
            high = self.high,
            "fit search step"
        );

        if self.history.len() == self.history_len && self.history.front() == self.history.back() {
            self.history.clear();
            let outcome = if self.anomaly || self.low != self.high {
                FitOutcome::Oscillated { mid: self.low }
            } else {
                FitOutcome::Converged { mid: self.low }
            };
            self.outcome = Some(outcome);
            return SearchStep::Done(outcome);
        }

        if self.measurements >= self.max_measurements {
            let outcome = FitOutcome::Exhausted { mid: self.low };
            self.outcome = Some(outcome);
            return SearchStep::Done(outcome);
        }

        self.awaiting = Probe::Candidate(self.mid);
        SearchStep::Continue { mid: self.mid }
    }

    /// Current interval.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds {
            low: self.low,
            mid: self.mid,
            high: self.high,
        }
    }

    /// Rolling history of recent guesses, oldest first.
    pub fn history(&self) -> impl Iterator<Item = usize> + '_ {
        self.history.iter().copied()
    }

    /// Candidate measurements taken so far (the baseline is not counted).
    #[must_use]
    pub fn measurements(&self) -> u32 {
        self.measurements
    }

    /// Height budget the search compares against.
    #[must_use]
    pub fn budget(&self) -> f32 {
        self.budget
    }

    /// Whether `low` was ever measured as a fitting candidate.
    ///
    /// When false, nothing but the placeholder was seen to fit and the answer
    /// is the empty string.
    #[must_use]
    pub fn answer_verified(&self) -> bool {
        self.verified
    }

    /// Whether an inconsistent reading has been seen.
    #[must_use]
    pub fn saw_anomaly(&self) -> bool {
        self.anomaly
    }

    /// The outcome, once the search has stopped.
    #[must_use]
    pub fn outcome(&self) -> Option<FitOutcome> {
        self.outcome
    }

    /// Whether the search has stopped.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }
}
