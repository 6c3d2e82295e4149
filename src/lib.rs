//! # Dialectic Engine
//!
//! Multi-phase LLM reasoning: a thesis is generated, attacked by an antithesis
//! (optionally from several critique personas), and reconciled in a synthesis.
//! Contradictions and research proposals are extracted from the generated text,
//! and the adversarial intensity between thesis and antithesis is scored.
//!
//! ## Features
//!
//! - **Degraded modes**: antithesis or synthesis failures produce a partial result
//!   instead of an error
//! - **Persona fan-out**: concurrent critiques merged in persona order
//! - **Iteration**: each synthesis becomes the next thesis
//! - **Conflict scoring**: embedding distance, contradiction count and an LLM judge
//! - **Result cache**: content-addressed JSON files with lazy TTL expiry
//!
//! ## Architecture
//!
//! ```text
//! DialecticService → ResultCache
//!        ↓
//!      Engine → Backend (Langbase Pipes over HTTP)
//!        ↓
//!   ConflictScorer → Embedder
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dialectic_engine::{Config, DialecticRequest, DialecticService};
//! use dialectic_engine::langbase::{LangbaseBackend, LangbaseClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let client = LangbaseClient::new(&config.langbase, config.request.clone())?;
//!     let backend = LangbaseBackend::new(client, &config.langbase.pipe, &config.engine.model);
//!     let service = DialecticService::new(config, Arc::new(backend));
//!     let result = service.run(DialecticRequest::new("Is free will compatible with determinism?")).await?;
//!     println!("{}", result.synthesis);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Backend and embedder capability traits.
pub mod backend;
/// File-backed result cache.
pub mod cache;
/// Configuration management.
pub mod config;
/// Phase state machine, conflict scoring and output parsing.
pub mod engine;
/// Error types and result aliases for the application.
pub mod error;
/// Langbase API client and backend adapter.
pub mod langbase;
/// Built-in critique personas.
pub mod personas;
/// Phase system prompts and prompt builders.
pub mod prompts;
/// Public result types and schema validation.
pub mod result;
/// Cache-aware top-level service.
pub mod service;

pub use backend::{Backend, BackendIdentity, Embedder, GenerationRequest, HashEmbedder};
pub use cache::{compute_key, ResultCache};
pub use config::Config;
pub use engine::{DialecticRequest, Engine, StreamChunk, MAX_ITERATIONS};
pub use error::{AppError, AppResult, BackendError, BackendResult};
pub use personas::{resolve_personas, Persona};
pub use result::{DialecticResult, Phase, ResultMode};
pub use service::DialecticService;
