//! Phase state machine for one engine run.
//!
//! ```text
//! INIT → THESIS → ANTITHESIS → SYNTHESIS → DONE
//!                      ↑            │
//!                      └────────────┘  (next iteration)
//! ```
//!
//! Each phase may be marked failed while it is current. A failed thesis is terminal;
//! failed antithesis/synthesis phases still advance.

use crate::error::{AppError, AppResult};
use crate::result::Phase;

/// Current position of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    InPhase { phase: Phase, failed: bool },
    Done,
}

impl PipelineState {
    /// Move into `next`, validating the ordering.
    pub fn enter(self, next: Phase) -> AppResult<Self> {
        let allowed = match (self, next) {
            (PipelineState::Init, Phase::Thesis) => true,
            (
                PipelineState::InPhase {
                    phase: Phase::Thesis,
                    failed: false,
                },
                Phase::Antithesis,
            ) => true,
            (
                PipelineState::InPhase {
                    phase: Phase::Antithesis,
                    ..
                },
                Phase::Synthesis,
            ) => true,
            (
                PipelineState::InPhase {
                    phase: Phase::Synthesis,
                    ..
                },
                Phase::Antithesis,
            ) => true,
            _ => false,
        };

        if allowed {
            Ok(PipelineState::InPhase {
                phase: next,
                failed: false,
            })
        } else {
            Err(invalid(self, &format!("enter {}", next)))
        }
    }

    /// Mark the current phase failed.
    pub fn fail(self) -> AppResult<Self> {
        match self {
            PipelineState::InPhase { phase, .. } => Ok(PipelineState::InPhase {
                phase,
                failed: true,
            }),
            other => Err(invalid(other, "fail")),
        }
    }

    /// Close the run. Only legal after a synthesis phase.
    pub fn finish(self) -> AppResult<Self> {
        match self {
            PipelineState::InPhase {
                phase: Phase::Synthesis,
                ..
            } => Ok(PipelineState::Done),
            other => Err(invalid(other, "finish")),
        }
    }

    /// Phase currently executing, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            PipelineState::InPhase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PipelineState::InPhase { failed: true, .. })
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Init => write!(f, "INIT"),
            PipelineState::InPhase { phase, failed } => {
                write!(f, "{}", phase.as_str().to_uppercase())?;
                if *failed {
                    write!(f, "(FAILED)")?;
                }
                Ok(())
            }
            PipelineState::Done => write!(f, "DONE"),
        }
    }
}

fn invalid(state: PipelineState, action: &str) -> AppError {
    AppError::Internal {
        message: format!("Invalid pipeline transition: cannot {} from {}", action, state),
    }
}
