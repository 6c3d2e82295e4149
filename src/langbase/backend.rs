use async_trait::async_trait;
use tracing::debug;

use super::client::LangbaseClient;
use super::types::{Message, PipeRequest};
use crate::backend::{Backend, BackendIdentity, GenerationRequest};
use crate::error::{BackendError, BackendResult};

/// [`Backend`] adapter that runs every generation through one Langbase pipe.
///
/// Model, temperature and token budget live on the pipe itself (see
/// [`LangbaseClient::ensure_pipe`]); the request's values are forwarded as pipe
/// variables for prompts that reference them.
#[derive(Clone)]
pub struct LangbaseBackend {
    client: LangbaseClient,
    pipe: String,
    model: String,
}

impl LangbaseBackend {
    /// Create a new backend bound to `pipe`
    pub fn new(client: LangbaseClient, pipe: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            pipe: pipe.into(),
            model: model.into(),
        }
    }

    /// Name of the pipe this backend runs
    pub fn pipe(&self) -> &str {
        &self.pipe
    }

    fn build_request(&self, request: &GenerationRequest) -> PipeRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.push(Message::user(request.prompt.clone()));

        PipeRequest::new(&self.pipe, messages)
            .with_variable("max_tokens", request.max_tokens.to_string())
            .with_variable("temperature", request.temperature.to_string())
    }
}

#[async_trait]
impl Backend for LangbaseBackend {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity::new("langbase", &self.model)
    }

    async fn generate(&self, request: GenerationRequest) -> BackendResult<String> {
        let response = self.client.call_pipe(self.build_request(&request)).await?;

        if response.completion.trim().is_empty() {
            return Err(BackendError::InvalidResponse {
                message: format!("Pipe '{}' returned an empty completion", self.pipe),
            });
        }

        if let Some(usage) = response.raw.as_ref().and_then(|raw| raw.usage.as_ref()) {
            debug!(
                pipe = %self.pipe,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Langbase token usage"
            );
        }

        Ok(response.completion)
    }
}
