//! Langbase Pipes adapter.
//!
//! [`LangbaseClient`] speaks the HTTP API; [`LangbaseBackend`] exposes it to the
//! engine as a [`crate::backend::Backend`].

mod backend;
mod client;
mod types;


pub use backend::LangbaseBackend;
pub use client::LangbaseClient;
pub use types::*;
