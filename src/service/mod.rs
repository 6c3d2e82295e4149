//! Top-level entry point: cache lookup, engine run, validation, cache write.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{Backend, Embedder};
use crate::cache::{compute_key, ResultCache};
use crate::config::Config;
use crate::engine::{DialecticRequest, Engine};
use crate::error::{AppError, AppResult};
use crate::result::{validate_result, DialecticResult, RESULT_FORMAT_VERSION};

/// Wires configuration, backend, embedder and cache together.
///
/// Cheap to clone; every call to [`DialecticService::run`] builds a fresh [`Engine`].
#[derive(Clone)]
pub struct DialecticService {
    config: Config,
    backend: Arc<dyn Backend>,
    embedder: Option<Arc<dyn Embedder>>,
    cache: Option<ResultCache>,
}

impl DialecticService {
    /// Create a new service. The cache is enabled according to `config.cache`.
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| ResultCache::new(&config.cache));
        Self {
            config,
            backend,
            embedder: None,
            cache,
        }
    }

    /// Use `embedder` for semantic distance instead of the hash fallback
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Replace the cache (`None` disables caching)
    pub fn with_cache(mut self, cache: Option<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cache key for `request`, or `None` when the request shape is not cacheable.
    ///
    /// The key does not cover personas, iterations, trace or streaming, so only
    /// plain single-pass requests use the cache.
    pub fn cache_key(&self, request: &DialecticRequest) -> Option<String> {
        if !request.is_single_pass() || request.include_trace || request.stream.is_some() {
            return None;
        }
        Some(compute_key(
            request.query.trim(),
            &self.config.engine.model,
            &self.backend.identity().to_string(),
            RESULT_FORMAT_VERSION,
            self.config.engine.max_tokens,
            request.debug,
        ))
    }

    /// Run one dialectic request.
    pub async fn run(&self, request: DialecticRequest) -> AppResult<DialecticResult> {
        if request.query.trim().is_empty() {
            return Err(AppError::InvalidRequest {
                field: "query".to_string(),
                reason: "Query cannot be empty".to_string(),
            });
        }

        let key = match &self.cache {
            Some(_) => self.cache_key(&request),
            None => None,
        };

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(result) = cache.load(key).await {
                info!(key = %key, "Returning cached result");
                return Ok(result);
            }
        }

        let engine = Engine::new(
            self.backend.clone(),
            self.embedder.clone(),
            self.config.engine.clone(),
        );
        let result = engine.process(&request).await?;

        if self.config.engine.validate_results {
            validate_result(&result)?;
            debug!("Result passed schema validation");
        }

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if result.is_degraded() {
                debug!(key = %key, mode = %result.mode, "Degraded result not cached");
            } else if let Err(e) = cache.save(key, &result).await {
                warn!(key = %key, error = %e, "Failed to write cache entry");
            }
        }

        Ok(result)
    }

    /// Blocking adapter over [`DialecticService::run`].
    ///
    /// Returns [`AppError::Internal`] when called from inside an async runtime.
    pub fn run_blocking(&self, request: DialecticRequest) -> AppResult<DialecticResult> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(AppError::Internal {
                message: "run_blocking called from inside an async runtime; use run instead"
                    .to_string(),
            });
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to build runtime: {}", e),
            })?;
        runtime.block_on(self.run(request))
    }
}
