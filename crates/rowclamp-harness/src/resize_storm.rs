#![forbid(unsafe_code)]

//! Resize storm generator and replay.
//!
//! Generates deterministic sequences of box-width changes and replays them
//! against a widget and its [`HeadlessBox`]. Each event may land in the same
//! layout pass as the previous one (`gap_passes == 0`) or after some passes
//! have run, so storms exercise both coalescing within a pass and resets in
//! the middle of a search.
//!
//! # Usage
//!
//! ```
//! use rowclamp_harness::resize_storm::{ResizeStorm, StormConfig, StormPattern};
//!
//! let storm = ResizeStorm::new(
//!     StormConfig::default()
//!         .with_seed(42)
//!         .with_pattern(StormPattern::Burst { count: 20 }),
//! );
//! assert_eq!(storm.events().len(), 20);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

use rowclamp_widgets::{FitOutcome, LayoutProbe, TruncatedText};
use serde_json::json;

use crate::HarnessError;
use crate::headless::HeadlessBox;

const ENV_STORM_SEED: &str = "ROWCLAMP_STORM_SEED";

// ============================================================================
// Configuration
// ============================================================================

/// Shape of a storm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StormPattern {
    /// Random small width changes, mostly within the same pass.
    Burst {
        /// Number of resize events.
        count: usize,
    },
    /// Linear sweep between two widths, one event per pass.
    Sweep {
        /// Starting width in pixels.
        start_width: u16,
        /// Ending width in pixels.
        end_width: u16,
        /// Number of steps.
        steps: usize,
    },
    /// Alternate between two widths.
    Oscillate {
        /// First width in pixels.
        width_a: u16,
        /// Second width in pixels.
        width_b: u16,
        /// Number of a/b pairs.
        cycles: usize,
    },
    /// Explicit `(width, gap_passes)` sequence.
    Custom {
        /// Events to replay.
        events: Vec<(u16, u32)>,
    },
}

impl StormPattern {
    /// Pattern name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Burst { .. } => "burst",
            Self::Sweep { .. } => "sweep",
            Self::Oscillate { .. } => "oscillate",
            Self::Custom { .. } => "custom",
        }
    }

    /// Number of events the pattern generates.
    #[must_use]
    pub fn event_count(&self) -> usize {
        match self {
            Self::Burst { count } => *count,
            Self::Sweep { steps, .. } => *steps,
            Self::Oscillate { cycles, .. } => cycles * 2,
            Self::Custom { events } => events.len(),
        }
    }
}

impl Default for StormPattern {
    fn default() -> Self {
        Self::Burst { count: 50 }
    }
}

/// Configuration for storm generation.
#[derive(Debug, Clone)]
pub struct StormConfig {
    /// Seed for deterministic generation.
    pub seed: u64,
    /// Storm shape.
    pub pattern: StormPattern,
    /// Width before the storm.
    pub initial_width: u16,
    /// Smallest width a burst may reach.
    pub min_width: u16,
    /// Largest width a burst may reach.
    pub max_width: u16,
    /// Largest number of passes between two burst events.
    pub max_gap_passes: u32,
    /// Case name for reports.
    pub case_name: String,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            pattern: StormPattern::default(),
            initial_width: 320,
            min_width: 40,
            max_width: 800,
            max_gap_passes: 2,
            case_name: "default".into(),
        }
    }
}

impl StormConfig {
    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: StormPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Set the width before the storm.
    #[must_use]
    pub fn with_initial_width(mut self, width: u16) -> Self {
        self.initial_width = width;
        self
    }

    /// Set burst width bounds.
    #[must_use]
    pub fn with_width_bounds(mut self, min_width: u16, max_width: u16) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }

    /// Set the largest gap between burst events.
    #[must_use]
    pub fn with_max_gap(mut self, passes: u32) -> Self {
        self.max_gap_passes = passes;
        self
    }

    /// Set the case name.
    #[must_use]
    pub fn with_case_name(mut self, name: impl Into<String>) -> Self {
        self.case_name = name.into();
        self
    }
}

// ============================================================================
// Seeded RNG
// ============================================================================

/// LCG for deterministic generation.
#[derive(Debug, Clone)]
struct SeededRng {
    state: u64,
}

impl SeededRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 11
    }

    fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

// ============================================================================
// Events
// ============================================================================

/// One width change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResizeEvent {
    /// New width in pixels.
    pub width: u16,
    /// Layout passes to run before this event. Zero means the same pass as
    /// the previous event.
    pub gap_passes: u32,
    /// Position in the sequence.
    pub index: usize,
}

impl ResizeEvent {
    /// Create an event.
    #[must_use]
    pub fn new(width: u16, gap_passes: u32, index: usize) -> Self {
        Self {
            width,
            gap_passes,
            index,
        }
    }

    /// Serialize to one JSON line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        json!({
            "event": "storm_resize",
            "idx": self.index,
            "width": self.width,
            "gap_passes": self.gap_passes,
        })
        .to_string()
    }
}

// ============================================================================
// Storm
// ============================================================================

/// A generated storm.
#[derive(Debug, Clone)]
pub struct ResizeStorm {
    config: StormConfig,
    events: Vec<ResizeEvent>,
}

impl ResizeStorm {
    /// Generate the storm described by `config`.
    #[must_use]
    pub fn new(config: StormConfig) -> Self {
        let mut storm = Self {
            config,
            events: Vec::new(),
        };
        storm.generate_events();
        storm
    }

    /// Generated events.
    #[must_use]
    pub fn events(&self) -> &[ResizeEvent] {
        &self.events
    }

    /// Configuration used.
    #[must_use]
    pub fn config(&self) -> &StormConfig {
        &self.config
    }

    /// Width after the last event.
    #[must_use]
    pub fn final_width(&self) -> u16 {
        self.events
            .last()
            .map_or(self.config.initial_width, |e| e.width)
    }

    /// Number of distinct layout passes the events land in.
    #[must_use]
    pub fn pass_groups(&self) -> usize {
        self.events
            .iter()
            .enumerate()
            .filter(|(i, e)| *i == 0 || e.gap_passes > 0)
            .count()
    }

    /// Deterministic checksum of the sequence.
    #[must_use]
    pub fn sequence_checksum(&self) -> String {
        let mut hasher = DefaultHasher::new();
        for event in &self.events {
            event.hash(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }

    fn generate_events(&mut self) {
        let mut rng = SeededRng::new(self.config.seed);
        self.events = match &self.config.pattern {
            StormPattern::Burst { count } => self.generate_burst(&mut rng, *count),
            StormPattern::Sweep {
                start_width,
                end_width,
                steps,
            } => Self::generate_sweep(*start_width, *end_width, *steps),
            StormPattern::Oscillate {
                width_a,
                width_b,
                cycles,
            } => Self::generate_oscillate(*width_a, *width_b, *cycles),
            StormPattern::Custom { events } => events
                .iter()
                .enumerate()
                .map(|(i, &(width, gap))| ResizeEvent::new(width, gap, i))
                .collect(),
        };
    }

    fn generate_burst(&self, rng: &mut SeededRng, count: usize) -> Vec<ResizeEvent> {
        let mut events = Vec::with_capacity(count);
        let mut width = i32::from(self.config.initial_width);
        let (lo, hi) = (
            i32::from(self.config.min_width),
            i32::from(self.config.max_width.max(self.config.min_width)),
        );

        for i in 0..count {
            let delta = rng.next_range(1, 48) as i32;
            let sign = if rng.chance(50) { 1 } else { -1 };
            width = (width + delta * sign).clamp(lo, hi);
            // Most events pile into the current pass.
            let gap = if i > 0 && self.config.max_gap_passes > 0 && rng.chance(20) {
                rng.next_range(1, u64::from(self.config.max_gap_passes) + 1) as u32
            } else {
                0
            };
            events.push(ResizeEvent::new(width as u16, gap, i));
        }
        events
    }

    fn generate_sweep(start: u16, end: u16, steps: usize) -> Vec<ResizeEvent> {
        (0..steps)
            .map(|i| {
                let t = if steps > 1 {
                    i as f64 / (steps - 1) as f64
                } else {
                    1.0
                };
                let width = (f64::from(start) + (f64::from(end) - f64::from(start)) * t).round();
                ResizeEvent::new(width as u16, 1, i)
            })
            .collect()
    }

    fn generate_oscillate(a: u16, b: u16, cycles: usize) -> Vec<ResizeEvent> {
        let mut events = Vec::with_capacity(cycles * 2);
        for cycle in 0..cycles {
            events.push(ResizeEvent::new(a, 0, cycle * 2));
            events.push(ResizeEvent::new(b, 0, cycle * 2 + 1));
        }
        events
    }

    /// Replay the storm against `widget` in `host`, then let it settle.
    ///
    /// Each pass the widget steps first and the box lays out after, as in
    /// [`Page::layout_pass`](crate::page::Page::layout_pass).
    pub fn replay(
        &self,
        widget: &mut TruncatedText,
        host: &mut HeadlessBox,
        settle_passes: usize,
    ) -> Result<StormReport, HarnessError> {
        let before = widget.stats();
        let coalesced_before = widget.coalesced_resizes();
        let mut passes = 0usize;

        for event in &self.events {
            for _ in 0..event.gap_passes {
                step_pass(widget, host);
                passes += 1;
            }
            let width = f32::from(event.width);
            host.set_width(width);
            widget.on_resize(width);
            tracing::trace!(idx = event.index, width, "storm resize");
        }

        let mut settled = false;
        for _ in 0..settle_passes {
            step_pass(widget, host);
            passes += 1;
            if widget.is_settled() && widget.in_flight().is_none() && host.content() == widget.output() {
                settled = true;
                break;
            }
        }
        if !settled {
            return Err(HarnessError::NotSettled { passes });
        }

        let after = widget.stats();
        let report = StormReport {
            case_name: self.config.case_name.clone(),
            pattern: self.config.pattern.name(),
            seed: self.config.seed,
            events: self.events.len(),
            passes,
            resets: after.resets - before.resets,
            coalesced: widget.coalesced_resizes() - coalesced_before,
            stale_discards: after.stale_discards - before.stale_discards,
            cancelled: after.cancelled - before.cancelled,
            final_width: host.box_width().unwrap_or_default(),
            outcome: widget.outcome(),
            output: widget.output().to_string(),
            checksum: self.sequence_checksum(),
        };
        tracing::debug!(
            case = %report.case_name,
            resets = report.resets,
            coalesced = report.coalesced,
            passes = report.passes,
            "storm replayed"
        );
        Ok(report)
    }
}

fn step_pass(widget: &mut TruncatedText, host: &mut HeadlessBox) {
    widget.after_layout(host);
    host.layout();
}

/// Result of a storm replay.
#[derive(Debug, Clone, PartialEq)]
pub struct StormReport {
    /// Case name from the configuration.
    pub case_name: String,
    /// Pattern name.
    pub pattern: &'static str,
    /// Seed used.
    pub seed: u64,
    /// Resize events replayed.
    pub events: usize,
    /// Layout passes run, settling included.
    pub passes: usize,
    /// Searches restarted during the replay.
    pub resets: u64,
    /// Notifications folded away by coalescing.
    pub coalesced: u64,
    /// Readings dropped as stale.
    pub stale_discards: u64,
    /// In-flight measurements abandoned by resets.
    pub cancelled: u64,
    /// Box width at the end.
    pub final_width: f32,
    /// Outcome of the final search, if one ran.
    pub outcome: Option<FitOutcome>,
    /// Final rendered string.
    pub output: String,
    /// Sequence checksum.
    pub checksum: String,
}

impl StormReport {
    /// Serialize to one JSON line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        json!({
            "event": "storm_complete",
            "case": self.case_name,
            "pattern": self.pattern,
            "seed": self.seed,
            "events": self.events,
            "passes": self.passes,
            "resets": self.resets,
            "coalesced": self.coalesced,
            "stale_discards": self.stale_discards,
            "cancelled": self.cancelled,
            "final_width": self.final_width,
            "outcome": self.outcome.map(FitOutcome::as_str),
            "output": self.output,
            "checksum": self.checksum,
        })
        .to_string()
    }
}

/// Storm seed from `ROWCLAMP_STORM_SEED`, or derived from the clock.
#[must_use]
pub fn get_storm_seed() -> u64 {
    std::env::var(ENV_STORM_SEED)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            let pid = u64::from(std::process::id());
            let time = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos() as u64;
            pid.wrapping_mul(time)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_generates_requested_count() {
        let storm = ResizeStorm::new(
            StormConfig::default()
                .with_seed(7)
                .with_pattern(StormPattern::Burst { count: 100 }),
        );
        assert_eq!(storm.events().len(), 100);
        assert!(
            storm
                .events()
                .iter()
                .all(|e| (40..=800).contains(&e.width))
        );
        assert_eq!(storm.events()[0].gap_passes, 0);
    }

    #[test]
    fn sweep_interpolates_endpoints() {
        let storm = ResizeStorm::new(StormConfig::default().with_pattern(StormPattern::Sweep {
            start_width: 400,
            end_width: 200,
            steps: 5,
        }));
        let widths: Vec<u16> = storm.events().iter().map(|e| e.width).collect();
        assert_eq!(widths, [400, 350, 300, 250, 200]);
        assert_eq!(storm.pass_groups(), 5);
    }

    #[test]
    fn oscillate_alternates_within_one_pass() {
        let storm = ResizeStorm::new(StormConfig::default().with_pattern(StormPattern::Oscillate {
            width_a: 100,
            width_b: 300,
            cycles: 3,
        }));
        assert_eq!(storm.events().len(), 6);
        assert_eq!(storm.events()[1].width, 300);
        assert_eq!(storm.pass_groups(), 1);
        assert_eq!(storm.final_width(), 300);
    }

    #[test]
    fn same_seed_same_sequence() {
        let config = StormConfig::default()
            .with_seed(12345)
            .with_pattern(StormPattern::Burst { count: 40 });
        let a = ResizeStorm::new(config.clone());
        let b = ResizeStorm::new(config);
        assert_eq!(a.events(), b.events());
        assert_eq!(a.sequence_checksum(), b.sequence_checksum());
    }

    #[test]
    fn different_seeds_differ() {
        let a = ResizeStorm::new(
            StormConfig::default()
                .with_seed(1)
                .with_pattern(StormPattern::Burst { count: 40 }),
        );
        let b = ResizeStorm::new(
            StormConfig::default()
                .with_seed(2)
                .with_pattern(StormPattern::Burst { count: 40 }),
        );
        assert_ne!(a.sequence_checksum(), b.sequence_checksum());
    }

    #[test]
    fn custom_pattern_keeps_events() {
        let storm = ResizeStorm::new(StormConfig::default().with_pattern(StormPattern::Custom {
            events: vec![(100, 0), (120, 3)],
        }));
        assert_eq!(storm.events()[1], ResizeEvent::new(120, 3, 1));
        assert_eq!(storm.pass_groups(), 2);
    }

    #[test]
    fn event_jsonl_is_valid_json() {
        let line = ResizeEvent::new(80, 1, 4).to_jsonl();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "storm_resize");
        assert_eq!(value["width"], 80);
    }
}
