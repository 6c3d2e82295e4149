//! Adversarial-intensity scoring between a thesis and its antithesis.
//!
//! The score blends three signals:
//! 1. semantic distance between the two texts' embeddings
//! 2. a step function of the number of extracted contradictions
//! 3. an LLM classifier's estimate of how strongly the antithesis opposes the thesis
//!
//! `score = clamp(max(0.4*distance + 0.3*signal + 0.3*llm, signal, llm), 0, 1)`

use std::sync::Arc;

use tracing::{debug, warn};

use super::parser::try_parse_conflict_value;
use crate::backend::{cosine_similarity, Backend, Embedder, GenerationRequest, HashEmbedder};
use crate::prompts::{conflict_prompt, CONFLICT_CLASSIFIER_PROMPT};
use crate::result::{ConflictBreakdown, Contradiction};

const SEMANTIC_WEIGHT: f64 = 0.4;
const CONTRADICTION_WEIGHT: f64 = 0.3;
const LLM_WEIGHT: f64 = 0.3;

/// Map a contradiction count onto `[0, 0.85]`.
pub fn contradiction_signal(count: usize) -> f64 {
    match count {
        0 => 0.0,
        1 => 0.30,
        2 => 0.50,
        3 => 0.60,
        4 => 0.72,
        _ => 0.85,
    }
}

/// Combine the three signals into a final score.
pub fn blend(semantic_distance: f64, contradiction_signal: f64, llm_conflict: f64) -> ConflictBreakdown {
    let semantic_distance = sanitize(semantic_distance);
    let contradiction_signal = sanitize(contradiction_signal);
    let llm_conflict = sanitize(llm_conflict);

    let weighted_blend = SEMANTIC_WEIGHT * semantic_distance
        + CONTRADICTION_WEIGHT * contradiction_signal
        + LLM_WEIGHT * llm_conflict;
    let score = weighted_blend
        .max(contradiction_signal)
        .max(llm_conflict)
        .clamp(0.0, 1.0);

    ConflictBreakdown {
        semantic_distance,
        contradiction_signal,
        llm_conflict,
        weighted_blend,
        score,
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Scores thesis/antithesis pairs using a backend and an optional embedder.
#[derive(Clone)]
pub struct ConflictScorer {
    backend: Arc<dyn Backend>,
    embedder: Option<Arc<dyn Embedder>>,
    max_tokens: u32,
}

impl ConflictScorer {
    /// Create a scorer. Without an embedder, [`HashEmbedder`] vectors are used.
    pub fn new(
        backend: Arc<dyn Backend>,
        embedder: Option<Arc<dyn Embedder>>,
        max_tokens: u32,
    ) -> Self {
        Self {
            backend,
            embedder,
            max_tokens,
        }
    }

    /// Conflict score in `[0, 1]`.
    pub async fn compute(
        &self,
        thesis: &str,
        antithesis: &str,
        contradictions: &[Contradiction],
    ) -> f64 {
        self.compute_breakdown(thesis, antithesis, contradictions)
            .await
            .score
    }

    /// Conflict score together with the signals it was derived from.
    pub async fn compute_breakdown(
        &self,
        thesis: &str,
        antithesis: &str,
        contradictions: &[Contradiction],
    ) -> ConflictBreakdown {
        let semantic_distance = self.semantic_distance(thesis, antithesis).await;
        let signal = contradiction_signal(contradictions.len());
        let llm_conflict = self.llm_conflict(thesis, antithesis).await;

        let breakdown = blend(semantic_distance, signal, llm_conflict);
        debug!(
            semantic_distance = breakdown.semantic_distance,
            contradiction_signal = breakdown.contradiction_signal,
            llm_conflict = breakdown.llm_conflict,
            score = breakdown.score,
            "Conflict score computed"
        );
        breakdown
    }

    /// `clamp(1 - cosine, 0, 1)` between the two embeddings.
    pub async fn semantic_distance(&self, thesis: &str, antithesis: &str) -> f64 {
        let a = self.embed(thesis).await;
        let b = self.embed(antithesis).await;
        (1.0 - cosine_similarity(&a, &b)).clamp(0.0, 1.0)
    }

    async fn embed(&self, text: &str) -> Vec<f32> {
        if let Some(embedder) = &self.embedder {
            match embedder.encode(text).await {
                Ok(vector) if !vector.is_empty() => return vector,
                Ok(_) => warn!("Embedder returned an empty vector, using hash embedding"),
                Err(e) => warn!(error = %e, "Embedding failed, using hash embedding"),
            }
        }
        HashEmbedder.embed(text)
    }

    /// Classifier estimate; `0.0` on backend or parse failure.
    pub async fn llm_conflict(&self, thesis: &str, antithesis: &str) -> f64 {
        let request = GenerationRequest::new(conflict_prompt(thesis, antithesis), self.max_tokens)
            .with_temperature(0.0)
            .with_system_prompt(CONFLICT_CLASSIFIER_PROMPT);

        match self.backend.generate(request).await {
            Ok(response) => match try_parse_conflict_value(&response) {
                Some(value) => value,
                None => {
                    warn!(
                        response = %response.chars().take(100).collect::<String>(),
                        "Conflict classifier returned no parseable value, defaulting to 0.0"
                    );
                    0.0
                }
            },
            Err(e) => {
                warn!(error = %e, "Conflict classifier call failed, defaulting to 0.0");
                0.0
            }
        }
    }
}
