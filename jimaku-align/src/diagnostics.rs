//! Structured record of recoverable conditions.
//!
//! Every warning the engine emits through `tracing` is also pushed here so
//! that callers get a value they can inspect, serialize or assert on.

use crate::types::{AlignmentPath, TimingSource};
use serde::Serialize;

/// A recoverable condition observed while processing one narration segment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A timing tier failed and the next one was tried
    TierFailed { tier: TimingSource, reason: String },
    /// Character timing had `end < start` and was corrected
    TimingInverted { index: usize, start: f64, end: f64 },
    /// Character start went backwards and was clamped
    StartRegressed { index: usize, start: f64, previous: f64 },
    /// Direct alignment characters differ from the reference
    TextMismatch { index: usize, expected: char, got: char },
    /// Alignment path stepped backwards
    PathInversion { step: usize },
    /// Alignment path covers too little of either sequence
    LowCoverage { recognized: f64, reference: f64 },
    /// A lower-precision alignment strategy was used
    ReducedPrecision { source: TimingSource },
    /// Explicit line-break part could not be located in the timing string
    NewlineUnmatched { part: String },
    /// No split candidate scored above the floor
    ForcedSplit { text: String, index: usize, score: f64 },
    /// Final line exceeds the per-line limit
    LineOverflow { line: String, length: usize, limit: usize },
    /// Cue end fell at or before its start and was pushed out
    EndBeforeStart { start: f64, end: f64 },
}

/// Summary of one sequence alignment run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlignmentReport {
    pub source: TimingSource,
    pub reference: String,
    pub recognized: String,
    pub distance: f64,
    pub path: AlignmentPath,
    pub recognized_coverage: f64,
    pub reference_coverage: f64,
}

/// Diagnostics for one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub events: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentReport>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recoverable condition and emit it as a warning.
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(?diagnostic, "recoverable condition");
        self.events.push(diagnostic);
    }

    pub fn set_alignment(&mut self, report: AlignmentReport) {
        self.alignment = Some(report);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.events.extend(other.events);
        if other.alignment.is_some() {
            self.alignment = other.alignment;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether any event matches `pred`.
    pub fn any(&self, pred: impl Fn(&Diagnostic) -> bool) -> bool {
        self.events.iter().any(pred)
    }
}
