//! Provider trait for embedding generation.

use async_trait::async_trait;

use crate::Result;

/// Provider for prompt embeddings.
///
/// Implementations report failures as [`MimirError`](crate::MimirError)
/// variants:
/// - `Transport`: connection failure, timeout, non-success status
/// - `Protocol`: malformed response or no prediction in it
/// - `Encoding`: the request could not be serialised
///
/// Callers in the session pipeline treat every error as "no embedding
/// available" and let the request through to the upstream.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Generate the embedding for a single prompt.
    async fn embed(&self, prompt: &str) -> Result<Vec<f64>>;
}
