//! Capability interfaces the engine depends on.
//!
//! - [`Backend`]: single-call text generation with optional streaming
//! - [`Embedder`]: text to fixed-length vector, with [`HashEmbedder`] as the
//!   deterministic fallback
//!
//! Provider adapters (see [`crate::langbase`]) implement [`Backend`]; the engine only
//! ever holds an `Arc<dyn Backend>`.

mod embedding;

pub use embedding::*;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, BackendResult};

/// A finite, non-restartable sequence of generated text chunks.
pub type TextStream = BoxStream<'static, BackendResult<String>>;

/// Parameters for a single generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl GenerationRequest {
    /// Create a new request with the given prompt and token budget
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature: 0.7,
            system_prompt: None,
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Provider and model a backend reports for metadata and cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendIdentity {
    pub provider: String,
    pub model: String,
}

impl BackendIdentity {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl std::fmt::Display for BackendIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// Text generation capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Provider/model identity of this backend.
    fn identity(&self) -> BackendIdentity;

    /// Generate a complete response.
    async fn generate(&self, request: GenerationRequest) -> BackendResult<String>;

    /// Generate a response incrementally.
    ///
    /// Backends without an incremental interface keep the default, which reports
    /// [`BackendError::StreamingUnsupported`].
    async fn stream_generate(&self, request: GenerationRequest) -> BackendResult<TextStream> {
        let _ = request;
        Err(BackendError::StreamingUnsupported)
    }
}
