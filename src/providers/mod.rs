//! Embedding providers.
//!
//! The session pipeline only sees the [`EmbeddingProvider`] trait, so the
//! HTTP call can be swapped for a stub in tests or moved behind a worker
//! pool without touching the session state machine.

pub mod http;
pub mod traits;

pub use http::HttpEmbeddingClient;
pub use traits::EmbeddingProvider;
