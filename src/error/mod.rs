use std::path::PathBuf;

use thiserror::Error;

use crate::result::Phase;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid request: {field} - {reason}")]
    InvalidRequest { field: String, reason: String },

    /// A phase whose failure cannot be degraded into a partial result.
    #[error("{phase} phase failed: {source}")]
    PhaseFailed {
        phase: Phase,
        #[source]
        source: BackendError,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Text generation backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Streaming not supported by this backend")]
    StreamingUnsupported,

    #[error("Generation failed: {message}")]
    Generation { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BackendError {
    /// Stable identifier recorded as `error_kind` in result metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Unavailable { .. } => "unavailable",
            BackendError::Api { .. } => "api",
            BackendError::InvalidResponse { .. } => "invalid_response",
            BackendError::Timeout { .. } => "timeout",
            BackendError::StreamingUnsupported => "streaming_unsupported",
            BackendError::Generation { .. } => "generation",
            BackendError::Http(_) => "http",
        }
    }
}

/// Embedding capability errors
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding model unavailable: {message}")]
    Unavailable { message: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result cache errors.
///
/// Only surfaced by [`crate::cache::ResultCache::save`]; reads degrade to a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid cache key: '{key}'")]
    InvalidKey { key: String },
}

/// Public result schema violations
#[derive(Debug, Error)]
#[error("Result failed schema validation: {}", violations.join("; "))]
pub struct SchemaError {
    pub violations: Vec<String>,
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Result type alias for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
