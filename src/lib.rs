//! Mimir - semantic response cache for LLM gateways
//!
//! Mimir runs as an Envoy `ext_proc` sidecar on the data path of an
//! inference gateway. For every request body carrying a JSON `prompt`
//! field it:
//!
//! 1. resolves the prompt's embedding, from an exact-match memo or an
//!    external embedding service;
//! 2. searches previously captured responses for the most similar prompt
//!    by cosine similarity;
//! 3. answers immediately with the captured response when the similarity
//!    reaches the configured threshold, so the upstream model is never
//!    called; otherwise lets the request through and captures the
//!    upstream's response for later.
//!
//! Any failure along the embedding path degrades to a cache miss.
//!
//! # Example
//!
//! ```rust,no_run
//! use mimir::Mimir;
//! use mimir::server::{ExtProcService, HealthService};
//! use tonic::transport::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let processor = Mimir::builder()
//!         .embedding_server("http://embedder:8080/v1/models/bge:predict")
//!         .similarity_threshold(0.8)
//!         .build()?;
//!
//!     Server::builder()
//!         .add_service(ExtProcService::new(processor).into_server())
//!         .add_service(HealthService.into_server())
//!         .serve("0.0.0.0:50051".parse()?)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod processor;
pub mod providers;
pub mod server;
pub mod similarity;
pub mod telemetry;
pub mod types;
mod version;

// Re-export main types at crate root
pub use cache::{CacheEntry, EmbeddingCache, SemanticCache, SemanticMatch};
pub use error::{MimirError, Result};
pub use processor::{Mimir, Processor, ProcessorBuilder, Session};
pub use providers::{EmbeddingProvider, HttpEmbeddingClient};
pub use similarity::cosine_similarity;
pub use types::{BodyChunk, InboundMessage, OutboundMessage};
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};
