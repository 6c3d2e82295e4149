//! Dialectic orchestration engine.
//!
//! This module provides:
//! - [`Engine`]: the thesis → antithesis → synthesis state machine with iteration
//!   and persona fan-out
//! - [`ConflictScorer`]: adversarial-intensity scoring between phases
//! - [`parser`]: tolerant extraction of contradictions and research proposals
//! - [`PipelineState`]: phase transition validation

mod conflict;
pub mod parser;
mod pipeline;
mod state;

pub use conflict::*;
pub use parser::{extract_contradictions, extract_research_proposals, parse_conflict_value};
pub use pipeline::*;
pub use state::PipelineState;
