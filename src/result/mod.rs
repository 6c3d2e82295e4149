//! Result model for dialectic runs.
//!
//! [`DialecticResult`] is the only entity returned across the crate boundary and
//! persisted by the cache. Its serialized shape is the public result schema checked
//! by [`validate_result`].

mod schema;


pub use schema::{validate_result, validate_value};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Version of the serialized result layout. Folded into cache keys.
pub const RESULT_FORMAT_VERSION: &str = "1";

/// One of the three ordered phases of a dialectic iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Thesis,
    Antithesis,
    Synthesis,
}

impl Phase {
    /// Get the phase name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Thesis => "thesis",
            Phase::Antithesis => "antithesis",
            Phase::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How far the pipeline progressed.
///
/// Reflects the last phase that completed without being replaced by a failure marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultMode {
    /// Thesis, antithesis and synthesis all completed.
    Synthesis,
    /// Synthesis failed; antithesis is real.
    Antithesis,
    /// Antithesis failed; only the thesis is real.
    ThesisOnly,
}

impl ResultMode {
    /// Derive the mode from the recoverable phase outcomes of one iteration.
    pub fn from_outcomes(antithesis_ok: bool, synthesis_ok: bool) -> Self {
        match (antithesis_ok, synthesis_ok) {
            (false, _) => ResultMode::ThesisOnly,
            (true, false) => ResultMode::Antithesis,
            (true, true) => ResultMode::Synthesis,
        }
    }

    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultMode::Synthesis => "synthesis",
            ResultMode::Antithesis => "antithesis",
            ResultMode::ThesisOnly => "thesis_only",
        }
    }
}

impl std::fmt::Display for ResultMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contradiction extracted from antithesis text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contradiction {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// A research proposal extracted from synthesis text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchProposal {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testable_prediction: Option<String>,
}

/// Record of a recoverable phase failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseErrorRecord {
    pub phase: Phase,
    pub error_kind: String,
    pub message: String,
}

/// Timing and failure of one phase call.
#[derive(Debug, Clone, Default)]
pub struct PhaseMetrics {
    pub duration: Duration,
    pub error: Option<PhaseErrorRecord>,
}

impl PhaseMetrics {
    /// Metrics for a phase that completed.
    pub fn ok(duration: Duration) -> Self {
        Self {
            duration,
            error: None,
        }
    }

    /// Metrics for a phase that was replaced by a failure marker.
    pub fn failed(duration: Duration, error: PhaseErrorRecord) -> Self {
        Self {
            duration,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Internal calibration values, only emitted for debug runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    pub conflict_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_breakdown: Option<ConflictBreakdown>,
    pub iterations_run: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub personas: Vec<String>,
}

/// Components of a conflict score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConflictBreakdown {
    pub semantic_distance: f64,
    pub contradiction_signal: f64,
    pub llm_conflict: f64,
    pub weighted_blend: f64,
    pub score: f64,
}

/// Run metadata attached to every result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub thesis_time_ms: u64,
    pub antithesis_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_time_ms: Option<u64>,
    pub total_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<PhaseErrorRecord>,
}

/// One executed iteration, kept when a trace is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationTrace {
    pub iteration: u32,
    pub mode: ResultMode,
    pub thesis: String,
    pub antithesis: String,
    pub synthesis: String,
    pub contradiction_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_score: Option<f64>,
}

/// Complete (possibly degraded) output of a dialectic run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialecticResult {
    pub query: String,
    pub mode: ResultMode,
    pub thesis: String,
    pub antithesis: String,
    pub synthesis: String,
    #[serde(default)]
    pub contradictions: Vec<Contradiction>,
    #[serde(default)]
    pub research_proposals: Vec<ResearchProposal>,
    #[serde(default)]
    pub metadata: ResultMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<IterationTrace>>,
}

impl DialecticResult {
    /// Whether any recoverable phase failure was recorded.
    pub fn is_degraded(&self) -> bool {
        !self.metadata.errors.is_empty()
    }

    /// Error records for one phase.
    pub fn errors_for(&self, phase: Phase) -> impl Iterator<Item = &PhaseErrorRecord> {
        self.metadata.errors.iter().filter(move |e| e.phase == phase)
    }
}
