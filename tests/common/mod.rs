//! Shared test helpers: a scripted backend that answers by phase.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use dialectic_engine::backend::{Backend, BackendIdentity, GenerationRequest};
use dialectic_engine::error::{BackendError, BackendResult};
use dialectic_engine::prompts::{
    ANTITHESIS_SYSTEM_PROMPT, CONFLICT_CLASSIFIER_PROMPT, SYNTHESIS_SYSTEM_PROMPT,
    THESIS_SYSTEM_PROMPT,
};

const PERSONA_PREFIX: &str = "You are critiquing as the ";

/// Which call a request belongs to, derived from its system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Thesis,
    Antithesis,
    Synthesis,
    Classifier,
}

/// Deterministic backend for engine tests.
///
/// Synthesis `n` (1-based, counted across the run) answers `"SYNTHESIS n ..."`, so
/// iteration chaining can be observed in the trace.
#[derive(Default)]
pub struct ScriptedBackend {
    failing: Mutex<HashSet<Call>>,
    failing_personas: Mutex<HashSet<String>>,
    failing_personas_once: Mutex<HashSet<String>>,
    thesis_calls: AtomicUsize,
    antithesis_calls: AtomicUsize,
    synthesis_calls: AtomicUsize,
    classifier_calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `call` fail
    pub fn failing(self, call: Call) -> Self {
        self.failing.lock().unwrap().insert(call);
        self
    }

    /// Make the critique of one persona fail
    pub fn failing_persona(self, name: &str) -> Self {
        self.failing_personas.lock().unwrap().insert(name.to_string());
        self
    }

    /// Make only the first critique of one persona fail
    pub fn failing_persona_once(self, name: &str) -> Self {
        self.failing_personas_once
            .lock()
            .unwrap()
            .insert(name.to_string());
        self
    }

    pub fn calls(&self, call: Call) -> usize {
        self.counter(call).load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn counter(&self, call: Call) -> &AtomicUsize {
        match call {
            Call::Thesis => &self.thesis_calls,
            Call::Antithesis => &self.antithesis_calls,
            Call::Synthesis => &self.synthesis_calls,
            Call::Classifier => &self.classifier_calls,
        }
    }

    fn classify(request: &GenerationRequest) -> Call {
        match request.system_prompt.as_deref() {
            Some(THESIS_SYSTEM_PROMPT) => Call::Thesis,
            Some(ANTITHESIS_SYSTEM_PROMPT) => Call::Antithesis,
            Some(SYNTHESIS_SYSTEM_PROMPT) => Call::Synthesis,
            Some(CONFLICT_CLASSIFIER_PROMPT) => Call::Classifier,
            other => panic!("unexpected system prompt: {:?}", other),
        }
    }
}

/// Persona named in a fanned-out critique prompt.
pub fn persona_of(prompt: &str) -> Option<&str> {
    prompt
        .strip_prefix(PERSONA_PREFIX)
        .and_then(|rest| rest.split(" (").next())
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity::new("scripted", "test-model")
    }

    async fn generate(&self, request: GenerationRequest) -> BackendResult<String> {
        let call = Self::classify(&request);
        let n = self.counter(call).fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());

        if self.failing.lock().unwrap().contains(&call) {
            return Err(BackendError::Generation {
                message: format!("scripted {:?} failure", call),
            });
        }

        Ok(match call {
            Call::Thesis => "THESIS: cities should ban cars downtown".to_string(),
            Call::Antithesis => match persona_of(&request.prompt) {
                Some(name) => {
                    if self.failing_personas.lock().unwrap().contains(name)
                        || self.failing_personas_once.lock().unwrap().remove(name)
                    {
                        return Err(BackendError::Timeout { timeout_ms: 10 });
                    }
                    format!(
                        "CONTRADICTION: {name} objection one\nEVIDENCE: {name} evidence\n\nCONTRADICTION: {name} objection two\n"
                    )
                }
                None => "CONTRADICTION: Deliveries need access\nEVIDENCE: Freight data\n\nCONTRADICTION: Disabled access suffers\n".to_string(),
            },
            Call::Synthesis => format!(
                "SYNTHESIS {n}: restrict cars with exemptions\nRESEARCH_PROPOSAL: Pilot a car-free zone\nTESTABLE_PREDICTION: Foot traffic rises 10%"
            ),
            Call::Classifier => r#"{"conflict":0.6}"#.to_string(),
        })
    }
}
