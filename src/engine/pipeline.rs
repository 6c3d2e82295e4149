use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::conflict::ConflictScorer;
use super::parser::{extract_contradictions, extract_research_proposals};
use super::state::PipelineState;
use crate::backend::{Backend, BackendIdentity, Embedder, GenerationRequest};
use crate::config::EngineConfig;
use crate::error::{AppError, AppResult, BackendError, BackendResult};
use crate::personas::Persona;
use crate::prompts::{
    antithesis_prompt, persona_antithesis_prompt, synthesis_prompt, thesis_prompt,
    ANTITHESIS_SYSTEM_PROMPT, SYNTHESIS_SYSTEM_PROMPT, THESIS_SYSTEM_PROMPT,
};
use crate::result::{
    ConflictBreakdown, Contradiction, DebugInfo, DialecticResult, IterationTrace, Phase,
    PhaseErrorRecord, PhaseMetrics, ResearchProposal, ResultMetadata, ResultMode,
};

/// Upper bound on synthesis-becomes-thesis iterations per request.
pub const MAX_ITERATIONS: u32 = 10;

/// Receiver side of incremental phase output.
pub type ChunkSink = mpsc::UnboundedSender<StreamChunk>;

/// A piece of phase output delivered while a phase is still running.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub phase: Phase,
    /// Zero-based iteration index.
    pub iteration: u32,
    /// Persona name for fanned-out antithesis calls.
    pub persona: Option<String>,
    pub text: String,
}

/// Input for one engine run.
#[derive(Debug, Clone)]
pub struct DialecticRequest {
    /// The question to reason about
    pub query: String,
    /// Number of antithesis/synthesis cycles (1..=MAX_ITERATIONS)
    pub iterations: u32,
    /// Critique personas; empty means a single critic
    pub personas: Vec<Persona>,
    /// Attach the debug block (conflict score) to metadata
    pub debug: bool,
    /// Attach a per-iteration trace
    pub include_trace: bool,
    /// Optional sink for incremental output
    pub stream: Option<ChunkSink>,
}

impl DialecticRequest {
    /// Create a new request with just a query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            iterations: 1,
            personas: Vec::new(),
            debug: false,
            include_trace: false,
            stream: None,
        }
    }

    /// Set the iteration count
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.clamp(1, MAX_ITERATIONS);
        self
    }

    /// Set the critique personas
    pub fn with_personas(mut self, personas: Vec<Persona>) -> Self {
        self.personas = personas;
        self
    }

    /// Enable the debug block
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enable the per-iteration trace
    pub fn with_trace(mut self, include_trace: bool) -> Self {
        self.include_trace = include_trace;
        self
    }

    /// Stream phase output into `sink`
    pub fn with_stream(mut self, sink: ChunkSink) -> Self {
        self.stream = Some(sink);
        self
    }

    /// Whether this request has the default shape (one critic, one iteration).
    pub fn is_single_pass(&self) -> bool {
        self.personas.is_empty() && self.iterations <= 1
    }
}

/// Antithesis phase output after fan-out/merge.
struct AntithesisOutcome {
    text: String,
    contradictions: Vec<Contradiction>,
    metrics: PhaseMetrics,
    /// One record per failed call (a fanned-out phase may fail partially).
    errors: Vec<PhaseErrorRecord>,
}

impl AntithesisOutcome {
    fn completed(&self) -> bool {
        self.metrics.is_ok()
    }
}

/// Output of one antithesis → synthesis cycle.
struct IterationOutcome {
    thesis: String,
    antithesis: AntithesisOutcome,
    synthesis: String,
    synthesis_metrics: PhaseMetrics,
    research_proposals: Vec<ResearchProposal>,
    conflict: Option<ConflictBreakdown>,
    mode: ResultMode,
}

impl IterationOutcome {
    fn trace(&self, iteration: u32) -> IterationTrace {
        IterationTrace {
            iteration,
            mode: self.mode,
            thesis: self.thesis.clone(),
            antithesis: self.antithesis.text.clone(),
            synthesis: self.synthesis.clone(),
            contradiction_count: self.antithesis.contradictions.len(),
            conflict_score: self.conflict.map(|c| c.score),
        }
    }

    fn errors(&self) -> Vec<PhaseErrorRecord> {
        let mut errors = self.antithesis.errors.clone();
        errors.extend(self.synthesis_metrics.error.clone());
        errors
    }
}

/// Drives the thesis → antithesis → synthesis state machine.
///
/// An engine holds no mutable state; build one per top-level invocation.
pub struct Engine {
    backend: Arc<dyn Backend>,
    scorer: ConflictScorer,
    settings: EngineConfig,
}

impl Engine {
    /// Create a new engine
    pub fn new(
        backend: Arc<dyn Backend>,
        embedder: Option<Arc<dyn Embedder>>,
        settings: EngineConfig,
    ) -> Self {
        let scorer = ConflictScorer::new(backend.clone(), embedder, settings.classifier_max_tokens);
        Self {
            backend,
            scorer,
            settings,
        }
    }

    /// Identity of the backend this engine calls.
    pub fn backend_identity(&self) -> BackendIdentity {
        self.backend.identity()
    }

    /// Run the pipeline to completion.
    ///
    /// Fails only on invalid input or a thesis failure; antithesis and synthesis
    /// failures are folded into a degraded result.
    pub async fn process(&self, request: &DialecticRequest) -> AppResult<DialecticResult> {
        let start = Instant::now();

        let query = request.query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest {
                field: "query".to_string(),
                reason: "Query cannot be empty".to_string(),
            });
        }
        let iterations = request.iterations.clamp(1, MAX_ITERATIONS);

        let mut state = PipelineState::Init.enter(Phase::Thesis)?;
        debug!(state = %state, personas = request.personas.len(), iterations, "Starting dialectic run");

        let thesis_request = GenerationRequest::new(thesis_prompt(query), self.settings.max_tokens)
            .with_temperature(self.settings.temperature)
            .with_system_prompt(THESIS_SYSTEM_PROMPT);
        let (thesis_result, thesis_elapsed) = self
            .call_phase(Phase::Thesis, 0, None, thesis_request, request.stream.as_ref())
            .await;
        let mut thesis = match thesis_result {
            Ok(text) => text,
            Err(e) => {
                state = state.fail()?;
                error!(state = %state, error = %e, "Thesis phase failed, aborting run");
                return Err(AppError::PhaseFailed {
                    phase: Phase::Thesis,
                    source: e,
                });
            }
        };
        info!(latency_ms = thesis_elapsed.as_millis(), "Thesis phase completed");

        let mut antithesis_elapsed = Duration::ZERO;
        let mut synthesis_elapsed = Duration::ZERO;
        let mut trace = Vec::new();
        let mut iterations_run = 0u32;
        let mut errors = Vec::new();
        let mut last: Option<IterationOutcome> = None;

        for iteration in 0..iterations {
            if let Some(previous) = last.take() {
                thesis = previous.synthesis;
            }

            let outcome = self
                .run_iteration(query, thesis.clone(), iteration, request, &mut state)
                .await?;

            iterations_run += 1;
            antithesis_elapsed += outcome.antithesis.metrics.duration;
            synthesis_elapsed += outcome.synthesis_metrics.duration;
            errors.extend(outcome.errors());
            if request.include_trace {
                trace.push(outcome.trace(iteration));
            }

            let mode = outcome.mode;
            last = Some(outcome);
            if mode != ResultMode::Synthesis {
                if iteration + 1 < iterations {
                    warn!(
                        iteration,
                        mode = %mode,
                        "Iteration degraded, stopping iteration loop early"
                    );
                }
                break;
            }
        }

        state = state.finish()?;
        let outcome = last.ok_or_else(|| AppError::Internal {
            message: "Dialectic run finished without an iteration".to_string(),
        })?;

        let identity = self.backend.identity();
        let total = start.elapsed();
        let debug_info = request.debug.then(|| DebugInfo {
            conflict_score: outcome.conflict.map(|c| c.score).unwrap_or(0.0),
            conflict_breakdown: outcome.conflict,
            iterations_run,
            personas: request.personas.iter().map(|p| p.name.clone()).collect(),
        });

        info!(
            state = %state,
            mode = %outcome.mode,
            contradictions = outcome.antithesis.contradictions.len(),
            proposals = outcome.research_proposals.len(),
            errors = errors.len(),
            latency_ms = total.as_millis(),
            "Dialectic run completed"
        );

        Ok(DialecticResult {
            query: query.to_string(),
            mode: outcome.mode,
            thesis: outcome.thesis,
            antithesis: outcome.antithesis.text,
            synthesis: outcome.synthesis,
            contradictions: outcome.antithesis.contradictions,
            research_proposals: outcome.research_proposals,
            metadata: ResultMetadata {
                thesis_time_ms: millis(thesis_elapsed),
                antithesis_time_ms: millis(antithesis_elapsed),
                synthesis_time_ms: Some(millis(synthesis_elapsed)),
                total_time_ms: millis(total),
                backend_provider: Some(identity.provider),
                backend_model: Some(identity.model),
                debug: debug_info,
                errors,
            },
            timestamp: Some(Utc::now().to_rfc3339()),
            trace: request.include_trace.then_some(trace),
        })
    }

    /// One antithesis → (score) → synthesis cycle over `thesis`.
    async fn run_iteration(
        &self,
        query: &str,
        thesis: String,
        iteration: u32,
        request: &DialecticRequest,
        state: &mut PipelineState,
    ) -> AppResult<IterationOutcome> {
        *state = state.enter(Phase::Antithesis)?;

        let antithesis = if request.personas.is_empty() {
            self.single_antithesis(query, &thesis, iteration, request.stream.as_ref())
                .await
        } else {
            self.persona_antithesis(query, &thesis, iteration, &request.personas, request.stream.as_ref())
                .await
        };
        if !antithesis.completed() {
            *state = state.fail()?;
            warn!(state = %state, iteration, "Antithesis degraded, continuing to synthesis");
        }

        // A single distance against N concatenated critiques says nothing useful,
        // so fanned-out runs are not scored.
        let conflict = if antithesis.completed() && request.personas.is_empty() {
            Some(
                self.scorer
                    .compute_breakdown(&thesis, &antithesis.text, &antithesis.contradictions)
                    .await,
            )
        } else {
            None
        };

        *state = state.enter(Phase::Synthesis)?;
        let synthesis_request = GenerationRequest::new(
            synthesis_prompt(query, &thesis, &antithesis.text),
            self.settings.max_tokens,
        )
        .with_temperature(self.settings.temperature)
        .with_system_prompt(SYNTHESIS_SYSTEM_PROMPT);
        let (synthesis_result, synthesis_elapsed) = self
            .call_phase(Phase::Synthesis, iteration, None, synthesis_request, request.stream.as_ref())
            .await;

        let (synthesis, research_proposals, synthesis_metrics) = match synthesis_result {
            Ok(text) => {
                let proposals = extract_research_proposals(&text);
                (text, proposals, PhaseMetrics::ok(synthesis_elapsed))
            }
            Err(e) => {
                *state = state.fail()?;
                warn!(state = %state, iteration, error = %e, "Synthesis phase failed");
                let record = error_record(Phase::Synthesis, &e, None);
                (
                    failure_marker(Phase::Synthesis, &e),
                    Vec::new(),
                    PhaseMetrics::failed(synthesis_elapsed, record),
                )
            }
        };

        let mode = ResultMode::from_outcomes(antithesis.completed(), synthesis_metrics.is_ok());
        debug!(
            iteration,
            mode = %mode,
            contradictions = antithesis.contradictions.len(),
            conflict_score = conflict.map(|c| c.score),
            "Iteration completed"
        );

        Ok(IterationOutcome {
            thesis,
            antithesis,
            synthesis,
            synthesis_metrics,
            research_proposals,
            conflict,
            mode,
        })
    }

    async fn single_antithesis(
        &self,
        query: &str,
        thesis: &str,
        iteration: u32,
        sink: Option<&ChunkSink>,
    ) -> AntithesisOutcome {
        let request = GenerationRequest::new(antithesis_prompt(query, thesis), self.settings.max_tokens)
            .with_temperature(self.settings.temperature)
            .with_system_prompt(ANTITHESIS_SYSTEM_PROMPT);
        let (result, elapsed) = self
            .call_phase(Phase::Antithesis, iteration, None, request, sink)
            .await;

        match result {
            Ok(text) => AntithesisOutcome {
                contradictions: extract_contradictions(&text),
                text,
                metrics: PhaseMetrics::ok(elapsed),
                errors: Vec::new(),
            },
            Err(e) => {
                let record = error_record(Phase::Antithesis, &e, None);
                AntithesisOutcome {
                    text: failure_marker(Phase::Antithesis, &e),
                    contradictions: Vec::new(),
                    metrics: PhaseMetrics::failed(elapsed, record.clone()),
                    errors: vec![record],
                }
            }
        }
    }

    /// Fan the critique out across personas and merge in persona order.
    ///
    /// The phase counts as completed when at least one persona call succeeded.
    async fn persona_antithesis(
        &self,
        query: &str,
        thesis: &str,
        iteration: u32,
        personas: &[Persona],
        sink: Option<&ChunkSink>,
    ) -> AntithesisOutcome {
        let start = Instant::now();
        let calls = personas.iter().map(|persona| {
            let request = GenerationRequest::new(
                persona_antithesis_prompt(query, thesis, persona),
                self.settings.max_tokens,
            )
            .with_temperature(self.settings.temperature)
            .with_system_prompt(ANTITHESIS_SYSTEM_PROMPT);
            self.call_phase(Phase::Antithesis, iteration, Some(persona.name.as_str()), request, sink)
        });
        let results = join_all(calls).await;
        let elapsed = start.elapsed();

        let mut sections = Vec::with_capacity(personas.len());
        let mut contradictions = Vec::new();
        let mut errors = Vec::new();

        for (persona, (result, _)) in personas.iter().zip(results) {
            match result {
                Ok(text) => {
                    contradictions.extend(extract_contradictions(&text));
                    sections.push(persona_section(persona, text.trim()));
                }
                Err(e) => {
                    warn!(persona = %persona.name, error = %e, "Persona critique failed");
                    sections.push(persona_section(persona, &failure_marker(Phase::Antithesis, &e)));
                    errors.push(error_record(Phase::Antithesis, &e, Some(persona)));
                }
            }
        }

        if errors.len() == personas.len() {
            let first = errors[0].clone();
            return AntithesisOutcome {
                text: format!(
                    "[antithesis phase failed: all {} persona critiques failed]",
                    personas.len()
                ),
                contradictions: Vec::new(),
                metrics: PhaseMetrics::failed(elapsed, first),
                errors,
            };
        }

        AntithesisOutcome {
            text: sections.join("\n\n"),
            contradictions,
            metrics: PhaseMetrics::ok(elapsed),
            errors,
        }
    }

    /// Issue one backend call, streaming into `sink` when one is supplied.
    async fn call_phase(
        &self,
        phase: Phase,
        iteration: u32,
        persona: Option<&str>,
        request: GenerationRequest,
        sink: Option<&ChunkSink>,
    ) -> (BackendResult<String>, Duration) {
        let start = Instant::now();
        debug!(phase = %phase, iteration, persona = ?persona, "Calling backend");

        let result = match sink {
            Some(sink) => {
                self.generate_streaming(phase, iteration, persona, request, sink)
                    .await
            }
            None => self.backend.generate(request).await,
        };
        (result, start.elapsed())
    }

    async fn generate_streaming(
        &self,
        phase: Phase,
        iteration: u32,
        persona: Option<&str>,
        request: GenerationRequest,
        sink: &ChunkSink,
    ) -> BackendResult<String> {
        let emit = |text: &str| {
            // A dropped receiver only loses the live view; the result is unaffected.
            let _ = sink.send(StreamChunk {
                phase,
                iteration,
                persona: persona.map(str::to_string),
                text: text.to_string(),
            });
        };

        match self.backend.stream_generate(request.clone()).await {
            Ok(mut stream) => {
                let mut text = String::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    emit(&chunk);
                    text.push_str(&chunk);
                }
                Ok(text)
            }
            Err(BackendError::StreamingUnsupported) => {
                let text = self.backend.generate(request).await?;
                emit(&text);
                Ok(text)
            }
            Err(e) => Err(e),
        }
    }
}

fn persona_section(persona: &Persona, body: &str) -> String {
    format!("## {} critique\n\n{}", persona.name, body)
}

fn failure_marker(phase: Phase, error: &BackendError) -> String {
    format!("[{} phase failed: {}]", phase, error)
}

fn error_record(phase: Phase, error: &BackendError, persona: Option<&Persona>) -> PhaseErrorRecord {
    PhaseErrorRecord {
        phase,
        error_kind: error.kind().to_string(),
        message: match persona {
            Some(p) => format!("{}: {}", p.name, error),
            None => error.to_string(),
        },
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
