#![forbid(unsafe_code)]

//! Row-clamped text component.
//!
//! [`TruncatedText`] owns one text, one row budget, and the fit search that
//! runs against the box it renders into. It is stepped by the host, one
//! measurement per layout pass:
//!
//! ```text
//!   after_layout ──► drain resize ──► read in-flight height ──► poll ──► commit
//!        ▲                                                               │
//!        └──────────────────── host lays out the box ◄──────────────────┘
//! ```
//!
//! # Generations
//!
//! Any change to text, rows, expanded state, or box width starts a new
//! [`Generation`]. A reading whose [`Ticket`] carries an older generation is
//! discarded, so a measurement taken against the old input can never steer
//! the new search.
//!
//! # Phases
//!
//! | Phase | What gets committed |
//! |-------|---------------------|
//! | line height | the placeholder, to sample one line |
//! | searching | the placeholder (baseline), then candidates |
//! | settled | the answer, once |
//! | expanded | the full text, once |
//!
//! Zero rows, a zero-width box, and text with no words settle immediately
//! without measuring.

use std::collections::VecDeque;
use std::fmt::Write as _;

use rowclamp_core::config::json_escape;
use rowclamp_core::{ResizeCoalescer, TruncateConfig};
use rowclamp_text::WordSeq;

use crate::fit_search::{FitOutcome, FitSearch, Probe, SearchStep};
use crate::probe::{Generation, LayoutProbe, MeasureKind, Ticket};

/// Maximum number of events kept in a widget's trace.
const TRACE_CAPACITY: usize = 512;

/// Inputs of a [`TruncatedText`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateProps {
    /// Source text.
    pub text: String,
    /// Row budget; `None` uses [`TruncateConfig::default_rows`].
    pub rows: Option<u16>,
    /// Show the full text and skip the search.
    pub expanded: bool,
}

impl TruncateProps {
    /// Props for `text` with the default row budget, collapsed.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: None,
            expanded: false,
        }
    }

    /// Set the row budget.
    #[must_use]
    pub fn rows(mut self, rows: u16) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Set the expanded flag.
    #[must_use]
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }
}

/// What the host should do after [`TruncatedText::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Commit `content`, lay out, then report the height with `ticket`.
    Measure {
        /// Tag to pass back to [`TruncatedText::complete`].
        ticket: Ticket,
        /// String to render.
        content: String,
    },
    /// Commit `content` as the final rendering. No reading is expected.
    Commit {
        /// String to render.
        content: String,
    },
    /// Nothing to do until an in-flight reading completes or an input changes.
    Idle,
}

/// How [`TruncatedText::complete`] treated a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The reading advanced the search.
    Applied,
    /// The reading belonged to an earlier generation and was dropped.
    Stale,
    /// The ticket matched the generation but not the in-flight measurement.
    Unexpected,
}

/// Result of one [`TruncatedText::after_layout`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPass {
    /// The box is not measurable yet; nothing changed.
    Deferred,
    /// A measurement string was committed.
    Proposed,
    /// The final string was committed.
    Committed,
    /// No work was needed.
    Idle,
}

/// Why a search was restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetReason {
    /// Source text changed.
    Text,
    /// Row budget changed.
    Rows,
    /// Box width changed.
    Width,
    /// Expanded flag changed.
    Expanded,
    /// Configuration replaced.
    Config,
    /// Explicit restart by the host.
    Restart,
}

impl ResetReason {
    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Rows => "rows",
            Self::Width => "width",
            Self::Expanded => "expanded",
            Self::Config => "config",
            Self::Restart => "restart",
        }
    }
}

/// One decision recorded in a widget's trace.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// A new generation started.
    Reset {
        /// The new generation.
        generation: Generation,
        /// What triggered it.
        reason: ResetReason,
    },
    /// Line height was sampled.
    LineHeight {
        /// Generation of the reading.
        generation: Generation,
        /// Measured height of one line.
        height: f32,
        /// Resulting height budget.
        budget: f32,
    },
    /// A search measurement was applied.
    Measured {
        /// Generation of the reading.
        generation: Generation,
        /// Baseline or candidate.
        kind: MeasureKind,
        /// Measured height.
        height: f32,
        /// Whether it fit the budget.
        fits: bool,
        /// Interval after the step.
        low: usize,
        /// Next guess after the step.
        mid: usize,
        /// Interval after the step.
        high: usize,
    },
    /// A reading from an older generation was dropped.
    Stale {
        /// Generation on the ticket.
        ticket: Generation,
        /// Generation at the time of arrival.
        current: Generation,
    },
    /// The answer was fixed.
    Settled {
        /// Generation settled.
        generation: Generation,
        /// Search outcome, `None` when no search was needed.
        outcome: Option<FitOutcome>,
        /// Source words visible in the answer.
        words_shown: usize,
    },
}

impl SearchEvent {
    /// Serialize to a single JSON line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::with_capacity(96);
        match self {
            Self::Reset { generation, reason } => {
                let _ = write!(
                    out,
                    r#"{{"event":"reset","generation":{},"reason":"{}"}}"#,
                    generation.0,
                    reason.as_str()
                );
            }
            Self::LineHeight {
                generation,
                height,
                budget,
            } => {
                let _ = write!(
                    out,
                    r#"{{"event":"line_height","generation":{},"height":{height:.2},"budget":{budget:.2}}}"#,
                    generation.0
                );
            }
            Self::Measured {
                generation,
                kind,
                height,
                fits,
                low,
                mid,
                high,
            } => {
                let _ = write!(
                    out,
                    r#"{{"event":"measured","generation":{},"kind":"{}","height":{height:.2},"fits":{fits},"low":{low},"mid":{mid},"high":{high}}}"#,
                    generation.0,
                    kind.as_str()
                );
            }
            Self::Stale { ticket, current } => {
                let _ = write!(
                    out,
                    r#"{{"event":"stale","ticket":{},"current":{}}}"#,
                    ticket.0, current.0
                );
            }
            Self::Settled {
                generation,
                outcome,
                words_shown,
            } => {
                let outcome = outcome.map_or("none", FitOutcome::as_str);
                let _ = write!(
                    out,
                    r#"{{"event":"settled","generation":{},"outcome":"{}","words_shown":{words_shown}}}"#,
                    generation.0,
                    json_escape(outcome)
                );
            }
        }
        out
    }
}

/// Lifetime counters for one widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Line-height samples applied.
    pub line_height_measurements: u64,
    /// Baseline readings applied.
    pub baseline_measurements: u64,
    /// Candidate readings applied.
    pub candidate_measurements: u64,
    /// Readings dropped because their generation was stale.
    pub stale_discards: u64,
    /// In-flight measurements abandoned by a reset.
    pub cancelled: u64,
    /// Generations started after the first.
    pub resets: u64,
    /// Layout passes skipped because the box was not measurable.
    pub deferred_passes: u64,
    /// Line-height samples rejected as non-positive or non-finite.
    pub unmeasurable: u64,
    /// Searches completed.
    pub searches: u64,
}

#[derive(Debug, Clone)]
enum Phase {
    LineHeight,
    Searching(FitSearch),
    Settled { committed: bool },
    Expanded { committed: bool },
}

/// Text clamped to a row budget by measuring the box it renders into.
#[derive(Debug, Clone)]
pub struct TruncatedText {
    config: TruncateConfig,
    words: WordSeq,
    rows: u16,
    expanded: bool,
    width: Option<f32>,
    resize: ResizeCoalescer,
    line_height: Option<f32>,
    budget: Option<f32>,
    generation: Generation,
    phase: Phase,
    in_flight: Option<Ticket>,
    answer: String,
    outcome: Option<FitOutcome>,
    stats: SearchStats,
    trace: VecDeque<SearchEvent>,
}

impl TruncatedText {
    /// Create a widget with the default configuration.
    #[must_use]
    pub fn new(props: TruncateProps) -> Self {
        Self::with_config(props, TruncateConfig::default())
    }

    /// Create a widget with an explicit configuration.
    #[must_use]
    pub fn with_config(props: TruncateProps, config: TruncateConfig) -> Self {
        let rows = props.rows.unwrap_or(config.default_rows);
        let mut widget = Self {
            words: WordSeq::new(props.text),
            rows,
            expanded: props.expanded,
            width: None,
            resize: ResizeCoalescer::new(),
            line_height: None,
            budget: None,
            generation: Generation::default(),
            phase: Phase::LineHeight,
            in_flight: None,
            answer: String::new(),
            outcome: None,
            stats: SearchStats::default(),
            trace: VecDeque::new(),
            config,
        };
        widget.phase = widget.initial_phase();
        widget
    }

    // --- inputs -----------------------------------------------------------

    /// Replace the source text. No-op if unchanged.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.words.source() {
            return;
        }
        self.words = WordSeq::new(text);
        self.reset(ResetReason::Text);
    }

    /// Replace the row budget. No-op if unchanged.
    pub fn set_rows(&mut self, rows: u16) {
        if rows == self.rows {
            return;
        }
        self.rows = rows;
        self.reset(ResetReason::Rows);
    }

    /// Toggle the expanded bypass. No-op if unchanged.
    ///
    /// Collapsing again starts a fresh search.
    pub fn set_expanded(&mut self, expanded: bool) {
        if expanded == self.expanded {
            return;
        }
        self.expanded = expanded;
        self.reset(ResetReason::Expanded);
    }

    /// Apply all props at once, resetting at most once.
    pub fn set_props(&mut self, props: TruncateProps) {
        let rows = props.rows.unwrap_or(self.config.default_rows);
        let mut reason = None;
        if props.text != self.words.source() {
            self.words = WordSeq::new(props.text);
            reason = Some(ResetReason::Text);
        }
        if rows != self.rows {
            self.rows = rows;
            reason = reason.or(Some(ResetReason::Rows));
        }
        if props.expanded != self.expanded {
            self.expanded = props.expanded;
            reason = reason.or(Some(ResetReason::Expanded));
        }
        if let Some(reason) = reason {
            self.reset(reason);
        }
    }

    /// Replace the configuration and start over, line height included.
    pub fn set_config(&mut self, config: TruncateConfig) {
        if config == self.config {
            return;
        }
        self.config = config;
        self.line_height = None;
        self.reset(ResetReason::Config);
    }

    /// Record a box width notification.
    ///
    /// Notifications are coalesced and applied at the next
    /// [`after_layout`](Self::after_layout) or [`flush_resize`](Self::flush_resize).
    pub fn on_resize(&mut self, width: f32) {
        self.resize.push(width);
    }

    /// Apply the coalesced width, if any. Returns true if a reset happened.
    ///
    /// Call once per layout pass when driving the widget with
    /// [`poll`](Self::poll) and [`complete`](Self::complete) directly.
    pub fn flush_resize(&mut self) -> bool {
        match self.resize.take() {
            Some(width) => self.apply_width(width),
            None => false,
        }
    }

    /// Start over from line-height sampling.
    pub fn restart(&mut self) {
        self.line_height = None;
        self.reset(ResetReason::Restart);
    }

    // --- stepping ---------------------------------------------------------

    /// Next action for the host.
    ///
    /// Returns [`Step::Idle`] while a measurement is in flight.
    pub fn poll(&mut self) -> Step {
        if self.in_flight.is_some() {
            return Step::Idle;
        }
        match &mut self.phase {
            Phase::LineHeight => self.propose(MeasureKind::LineHeight),
            Phase::Searching(search) => match search.next_probe() {
                Some(Probe::Baseline) => self.propose(MeasureKind::Baseline),
                Some(Probe::Candidate(mid)) => self.propose(MeasureKind::Candidate { mid }),
                None => Step::Idle,
            },
            Phase::Settled { committed } | Phase::Expanded { committed } if !*committed => {
                *committed = true;
                Step::Commit {
                    content: self.output().to_string(),
                }
            }
            Phase::Settled { .. } | Phase::Expanded { .. } => Step::Idle,
        }
    }

    /// Report the height measured for `ticket`.
    pub fn complete(&mut self, ticket: Ticket, height: f32) -> Completion {
        if ticket.generation != self.generation {
            self.stats.stale_discards += 1;
            tracing::debug!(
                ticket = %ticket.generation,
                current = %self.generation,
                kind = ticket.kind.as_str(),
                "discarding stale measurement"
            );
            self.record(SearchEvent::Stale {
                ticket: ticket.generation,
                current: self.generation,
            });
            return Completion::Stale;
        }
        if self.in_flight != Some(ticket) {
            tracing::warn!(kind = ticket.kind.as_str(), "unexpected measurement ticket");
            return Completion::Unexpected;
        }
        self.in_flight = None;

        match ticket.kind {
            MeasureKind::LineHeight => self.apply_line_height(height),
            MeasureKind::Baseline | MeasureKind::Candidate { .. } => {
                self.apply_measurement(ticket.kind, height)
            }
        }
    }

    /// Run one host layout pass against `probe`.
    ///
    /// Drains pending resizes, feeds the height of the in-flight measurement
    /// if the box has been laid out, and commits the next string.
    pub fn after_layout<P: LayoutProbe + ?Sized>(&mut self, probe: &mut P) -> LayoutPass {
        let span = tracing::debug_span!("rowclamp.layout_pass", generation = self.generation.0);
        let _guard = span.enter();

        if !probe.is_attached() {
            self.stats.deferred_passes += 1;
            tracing::trace!("box detached; deferring");
            return LayoutPass::Deferred;
        }

        if !self.flush_resize()
            && self.width.is_none()
            && let Some(width) = probe.box_width()
        {
            self.apply_width(width);
        }

        if let Some(ticket) = self.in_flight {
            let Some(height) = probe.box_height() else {
                self.stats.deferred_passes += 1;
                tracing::trace!(kind = ticket.kind.as_str(), "height not ready; deferring");
                return LayoutPass::Deferred;
            };
            self.complete(ticket, height);
        }

        match self.poll() {
            Step::Measure { content, .. } => {
                probe.commit(&content);
                LayoutPass::Proposed
            }
            Step::Commit { content } => {
                probe.commit(&content);
                LayoutPass::Committed
            }
            Step::Idle => LayoutPass::Idle,
        }
    }

    // --- introspection ----------------------------------------------------

    /// String to render.
    ///
    /// The full text when expanded, the answer once settled, and the best
    /// verified candidate (or empty) while a search is running.
    #[must_use]
    pub fn output(&self) -> &str {
        if self.expanded {
            self.words.source()
        } else {
            &self.answer
        }
    }

    /// Source text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.words.source()
    }

    /// Row budget in effect.
    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Whether the expanded bypass is active.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether the output is final for the current inputs.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self.phase, Phase::Settled { .. } | Phase::Expanded { .. })
    }

    /// Whether a measurement is awaiting a reading.
    #[must_use]
    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    /// Outcome of the last completed search in this generation.
    #[must_use]
    pub fn outcome(&self) -> Option<FitOutcome> {
        self.outcome
    }

    /// Sampled line height, if known.
    #[must_use]
    pub fn line_height(&self) -> Option<f32> {
        self.line_height
    }

    /// Height budget of the current search, if one has started.
    #[must_use]
    pub fn height_budget(&self) -> Option<f32> {
        self.budget
    }

    /// Box width the search runs against, if known.
    #[must_use]
    pub fn width(&self) -> Option<f32> {
        self.width
    }

    /// The search in progress, if any.
    #[must_use]
    pub fn search(&self) -> Option<&FitSearch> {
        match &self.phase {
            Phase::Searching(search) => Some(search),
            _ => None,
        }
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Resize notifications folded away by coalescing.
    #[must_use]
    pub fn coalesced_resizes(&self) -> u64 {
        self.resize.coalesced_total()
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &TruncateConfig {
        &self.config
    }

    /// Recorded decisions, oldest first. Empty unless tracing is enabled in
    /// the configuration.
    pub fn trace(&self) -> impl Iterator<Item = &SearchEvent> + '_ {
        self.trace.iter()
    }

    /// Recorded decisions as JSON lines.
    #[must_use]
    pub fn trace_jsonl(&self) -> String {
        let mut out = String::new();
        for event in &self.trace {
            out.push_str(&event.to_jsonl());
            out.push('\n');
        }
        out
    }

    // --- internals --------------------------------------------------------

    fn propose(&mut self, kind: MeasureKind) -> Step {
        let content = match kind {
            MeasureKind::LineHeight | MeasureKind::Baseline => self.config.placeholder.clone(),
            MeasureKind::Candidate { mid } => {
                self.words.candidate(mid, &self.config.ellipsis).into_owned()
            }
        };
        let ticket = Ticket::new(self.generation, kind);
        self.in_flight = Some(ticket);
        tracing::trace!(generation = %self.generation, kind = kind.as_str(), "proposing");
        Step::Measure { ticket, content }
    }

    fn apply_line_height(&mut self, height: f32) -> Completion {
        if !height.is_finite() || height <= 0.0 {
            self.stats.unmeasurable += 1;
            tracing::debug!(height, "unmeasurable line height; retrying next pass");
            return Completion::Applied;
        }
        self.stats.line_height_measurements += 1;
        self.line_height = Some(height);
        self.phase = self.begin_search();
        if let Some(budget) = self.budget {
            self.record(SearchEvent::LineHeight {
                generation: self.generation,
                height,
                budget,
            });
        }
        Completion::Applied
    }

    fn apply_measurement(&mut self, kind: MeasureKind, height: f32) -> Completion {
        let Phase::Searching(search) = &mut self.phase else {
            return Completion::Unexpected;
        };
        match kind {
            MeasureKind::Baseline => self.stats.baseline_measurements += 1,
            _ => self.stats.candidate_measurements += 1,
        }

        let fits = search.fits(height);
        let step = search.record(height);
        let bounds = search.bounds();
        let verified = search.answer_verified();

        if fits && verified && kind != MeasureKind::Baseline {
            self.answer = self
                .words
                .candidate(bounds.low, &self.config.ellipsis)
                .into_owned();
        }
        self.record(SearchEvent::Measured {
            generation: self.generation,
            kind,
            height,
            fits,
            low: bounds.low,
            mid: bounds.mid,
            high: bounds.high,
        });

        if let SearchStep::Done(outcome) = step {
            self.settle(Some(outcome), verified);
        }
        Completion::Applied
    }

    fn settle(&mut self, outcome: Option<FitOutcome>, verified: bool) {
        let words_shown = match outcome {
            Some(outcome) if verified => {
                self.answer = self
                    .words
                    .candidate(outcome.mid(), &self.config.ellipsis)
                    .into_owned();
                self.words.candidate_word_count(outcome.mid())
            }
            Some(_) => {
                self.answer.clear();
                0
            }
            None => 0,
        };
        if outcome.is_some() {
            self.stats.searches += 1;
        }
        self.outcome = outcome;
        self.phase = Phase::Settled { committed: false };
        tracing::debug!(
            generation = %self.generation,
            outcome = outcome.map_or("none", FitOutcome::as_str),
            words_shown,
            "settled"
        );
        if let Some(outcome) = outcome
            && !outcome.is_converged()
        {
            tracing::warn!(
                outcome = outcome.as_str(),
                mid = outcome.mid(),
                "fit search stopped without a clean convergence"
            );
        }
        self.record(SearchEvent::Settled {
            generation: self.generation,
            outcome,
            words_shown,
        });
    }

    /// Returns true if the width change restarted the search.
    fn apply_width(&mut self, width: f32) -> bool {
        if self.width == Some(width) {
            return false;
        }
        // A first width can only be taken silently while nothing has been
        // measured against the unknown one.
        let untouched =
            self.width.is_none() && self.line_height.is_none() && self.in_flight.is_none();
        self.width = Some(width);
        if untouched {
            tracing::trace!(width, "adopted initial width");
            if width <= 0.0 && !self.is_settled() {
                self.phase = self.initial_phase();
            }
            return false;
        }
        self.line_height = None;
        self.reset(ResetReason::Width);
        true
    }

    fn reset(&mut self, reason: ResetReason) {
        self.generation = self.generation.next();
        if let Some(ticket) = self.in_flight.take() {
            self.stats.cancelled += 1;
            tracing::trace!(kind = ticket.kind.as_str(), "cancelled in-flight measurement");
        }
        self.stats.resets += 1;
        self.outcome = None;
        self.answer.clear();
        self.budget = None;
        tracing::debug!(generation = %self.generation, reason = reason.as_str(), "reset");
        self.record(SearchEvent::Reset {
            generation: self.generation,
            reason,
        });
        self.phase = self.initial_phase();
    }

    /// Phase a fresh generation starts in. May settle immediately.
    fn initial_phase(&mut self) -> Phase {
        if self.expanded {
            return Phase::Expanded { committed: false };
        }
        if self.rows == 0 || self.width == Some(0.0) {
            self.settle(None, false);
            return Phase::Settled { committed: false };
        }
        if self.words.is_empty() {
            self.answer = self.words.source().to_string();
            self.settle(None, false);
            return Phase::Settled { committed: false };
        }
        if self.line_height.is_none() {
            return Phase::LineHeight;
        }
        self.begin_search()
    }

    fn begin_search(&mut self) -> Phase {
        let Some(line_height) = self.line_height else {
            return Phase::LineHeight;
        };
        let budget = (line_height * f32::from(self.rows)).round();
        self.budget = Some(budget);
        if budget <= 0.0 {
            self.settle(None, false);
            return Phase::Settled { committed: false };
        }
        tracing::debug!(
            generation = %self.generation,
            line_height,
            rows = self.rows,
            budget,
            words = self.words.len(),
            "starting fit search"
        );
        Phase::Searching(FitSearch::new(
            self.words.len(),
            budget,
            self.config.history_len,
            self.config.max_measurements,
        ))
    }

    fn record(&mut self, event: SearchEvent) {
        if !self.config.enable_trace {
            return;
        }
        if self.trace.len() == TRACE_CAPACITY {
            self.trace.pop_front();
        }
        self.trace.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Box that wraps at `per_line` characters, 20px per line, laid out on
    /// the next `layout()` call.
    struct CharBox {
        per_line: usize,
        attached: bool,
        content: String,
        height: Option<f32>,
        commits: usize,
    }

    impl CharBox {
        fn new(per_line: usize) -> Self {
            Self {
                per_line,
                attached: true,
                content: String::new(),
                height: None,
                commits: 0,
            }
        }

        fn layout(&mut self) {
            let chars = self.content.chars().count();
            self.height = Some(chars.div_ceil(self.per_line) as f32 * 20.0);
        }
    }

    impl LayoutProbe for CharBox {
        fn is_attached(&self) -> bool {
            self.attached
        }
        fn commit(&mut self, content: &str) {
            self.content = content.to_string();
            self.height = None;
            self.commits += 1;
        }
        fn box_height(&self) -> Option<f32> {
            self.height
        }
        fn box_width(&self) -> Option<f32> {
            Some(self.per_line as f32 * 8.0)
        }
    }

    fn drive(widget: &mut TruncatedText, host: &mut CharBox) -> usize {
        for pass in 0..64 {
            let result = widget.after_layout(host);
            host.layout();
            if widget.is_settled() && result == LayoutPass::Idle {
                return pass;
            }
        }
        panic!("widget did not settle");
    }

    #[test]
    fn short_text_is_shown_verbatim() {
        let mut widget = TruncatedText::new(TruncateProps::new("Short text."));
        let mut host = CharBox::new(40);
        drive(&mut widget, &mut host);
        assert_eq!(widget.output(), "Short text.");
        assert_eq!(host.content, "Short text.");
        assert!(widget.outcome().is_some_and(FitOutcome::is_converged));
    }

    #[test]
    fn long_text_is_clamped_with_ellipsis() {
        let text = "one two three four five six seven eight nine ten";
        let mut widget = TruncatedText::new(TruncateProps::new(text).rows(1));
        let mut host = CharBox::new(12);
        drive(&mut widget, &mut host);
        assert_eq!(widget.output(), "one two…");
        assert_eq!(host.content, "one two…");
    }

    #[test]
    fn first_proposal_samples_line_height() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c"));
        match widget.poll() {
            Step::Measure { ticket, content } => {
                assert_eq!(ticket.kind, MeasureKind::LineHeight);
                assert_eq!(content, ".");
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(widget.poll(), Step::Idle);
    }

    #[test]
    fn budget_is_rounded_line_height_times_rows() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c").rows(3));
        let Step::Measure { ticket, .. } = widget.poll() else {
            panic!("expected a measurement");
        };
        assert_eq!(widget.complete(ticket, 20.4), Completion::Applied);
        assert_eq!(widget.height_budget(), Some(61.0));
    }

    #[test]
    fn stale_reading_is_discarded() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c d"));
        let Step::Measure { ticket, .. } = widget.poll() else {
            panic!("expected a measurement");
        };
        widget.set_text("e f g h");
        assert_eq!(widget.complete(ticket, 20.0), Completion::Stale);
        assert_eq!(widget.stats().stale_discards, 1);
        assert_eq!(widget.line_height(), None);
    }

    #[test]
    fn mismatched_ticket_is_unexpected() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c d"));
        let _ = widget.poll();
        let bogus = Ticket::new(widget.generation(), MeasureKind::Candidate { mid: 2 });
        assert_eq!(widget.complete(bogus, 20.0), Completion::Unexpected);
        assert!(widget.in_flight().is_some());
    }

    #[test]
    fn unchanged_inputs_do_not_reset() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b").rows(2));
        let g = widget.generation();
        widget.set_text("a b");
        widget.set_rows(2);
        widget.set_expanded(false);
        widget.set_props(TruncateProps::new("a b").rows(2));
        assert_eq!(widget.generation(), g);
        assert_eq!(widget.stats().resets, 0);
    }

    #[test]
    fn set_props_resets_once() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b").rows(2));
        widget.set_props(TruncateProps::new("c d").rows(4));
        assert_eq!(widget.stats().resets, 1);
        assert_eq!(widget.rows(), 4);
        assert_eq!(widget.text(), "c d");
    }

    #[test]
    fn zero_rows_settles_empty_without_measuring() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c").rows(0));
        let mut host = CharBox::new(10);
        drive(&mut widget, &mut host);
        assert_eq!(widget.output(), "");
        assert_eq!(widget.stats().line_height_measurements, 0);
        assert_eq!(host.commits, 1);
    }

    #[test]
    fn blank_text_settles_verbatim() {
        let mut widget = TruncatedText::new(TruncateProps::new("   "));
        assert!(widget.is_settled());
        assert_eq!(widget.output(), "   ");
        assert_eq!(
            widget.poll(),
            Step::Commit {
                content: "   ".to_string()
            }
        );
    }

    #[test]
    fn expanded_bypasses_search() {
        let text = "one two three four five six seven eight nine ten";
        let mut widget = TruncatedText::new(TruncateProps::new(text).rows(1).expanded(true));
        let mut host = CharBox::new(12);
        drive(&mut widget, &mut host);
        assert_eq!(widget.output(), text);
        assert_eq!(widget.stats().candidate_measurements, 0);

        widget.set_expanded(false);
        drive(&mut widget, &mut host);
        assert_eq!(widget.output(), "one two…");
    }

    #[test]
    fn non_positive_line_height_retries() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c"));
        let Step::Measure { ticket, .. } = widget.poll() else {
            panic!("expected a measurement");
        };
        assert_eq!(widget.complete(ticket, 0.0), Completion::Applied);
        assert_eq!(widget.stats().unmeasurable, 1);
        let Step::Measure { ticket, .. } = widget.poll() else {
            panic!("expected a retry");
        };
        assert_eq!(ticket.kind, MeasureKind::LineHeight);
    }

    #[test]
    fn detached_box_defers() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c"));
        let mut host = CharBox::new(10);
        host.attached = false;
        assert_eq!(widget.after_layout(&mut host), LayoutPass::Deferred);
        assert_eq!(host.commits, 0);
        assert_eq!(widget.stats().deferred_passes, 1);
    }

    #[test]
    fn settled_widget_is_idle() {
        let mut widget = TruncatedText::new(TruncateProps::new("alpha beta gamma").rows(1));
        let mut host = CharBox::new(40);
        drive(&mut widget, &mut host);
        let commits = host.commits;
        let g = widget.generation();
        for _ in 0..5 {
            assert_eq!(widget.after_layout(&mut host), LayoutPass::Idle);
            host.layout();
        }
        assert_eq!(host.commits, commits);
        assert_eq!(widget.generation(), g);
    }

    #[test]
    fn resize_resets_and_resamples_line_height() {
        let text = "one two three four five six seven eight nine ten";
        let mut widget = TruncatedText::new(TruncateProps::new(text).rows(1));
        let mut host = CharBox::new(24);
        drive(&mut widget, &mut host);
        let wide = widget.output().to_string();

        host.per_line = 12;
        widget.on_resize(96.0);
        widget.on_resize(97.0);
        widget.on_resize(96.0);
        drive(&mut widget, &mut host);
        assert_eq!(widget.stats().resets, 1);
        assert_eq!(widget.stats().line_height_measurements, 2);
        assert!(widget.output().len() < wide.len());
    }

    /// Answer every measurement with `height_of` until the widget settles.
    fn settle_by_hand(widget: &mut TruncatedText, height_of: impl Fn(&str) -> f32) {
        for _ in 0..64 {
            match widget.poll() {
                Step::Measure { ticket, content } => {
                    widget.complete(ticket, height_of(&content));
                }
                Step::Commit { .. } => {}
                Step::Idle if widget.is_settled() => return,
                Step::Idle => {}
            }
        }
        panic!("widget did not settle");
    }

    #[test]
    fn first_width_after_measuring_resets() {
        let text = "one two three four five six";
        let mut widget = TruncatedText::new(TruncateProps::new(text).rows(1));
        settle_by_hand(&mut widget, |s| s.chars().count().div_ceil(30) as f32 * 20.0);
        assert_eq!(widget.output(), text);

        widget.on_resize(80.0);
        assert!(widget.flush_resize());
        assert_eq!(widget.stats().resets, 1);
        assert_eq!(widget.line_height(), None);
        assert!(!widget.is_settled());

        settle_by_hand(&mut widget, |s| s.chars().count().div_ceil(10) as f32 * 20.0);
        assert_eq!(widget.output(), "one two…");
    }

    #[test]
    fn first_width_before_measuring_is_adopted() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c"));
        widget.on_resize(120.0);
        assert!(!widget.flush_resize());
        assert_eq!(widget.width(), Some(120.0));
        assert_eq!(widget.stats().resets, 0);
    }

    #[test]
    fn first_width_of_zero_settles_without_reset() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c"));
        widget.on_resize(0.0);
        assert!(!widget.flush_resize());
        assert!(widget.is_settled());
        assert_eq!(widget.output(), "");
        assert_eq!(widget.stats().resets, 0);
        assert_eq!(widget.generation(), Generation::default());
    }

    #[test]
    fn trace_records_decisions_when_enabled() {
        let config = TruncateConfig::default().with_trace(true);
        let mut widget =
            TruncatedText::with_config(TruncateProps::new("a b c d e f").rows(1), config);
        let mut host = CharBox::new(6);
        drive(&mut widget, &mut host);
        let jsonl = widget.trace_jsonl();
        assert!(jsonl.contains(r#""event":"line_height""#));
        assert!(jsonl.contains(r#""event":"measured""#));
        assert!(jsonl.lines().last().is_some_and(|l| l.contains(r#""event":"settled""#)));
    }

    #[test]
    fn trace_is_empty_by_default() {
        let mut widget = TruncatedText::new(TruncateProps::new("a b c"));
        let mut host = CharBox::new(6);
        drive(&mut widget, &mut host);
        assert_eq!(widget.trace().count(), 0);
    }
}
