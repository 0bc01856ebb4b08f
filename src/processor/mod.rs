//! The caching engine driven by ext_proc sessions.
//!
//! A [`Processor`] holds the process-wide services (embedding memo,
//! semantic cache, embedding provider) and the similarity threshold. It
//! is cheap to clone; every clone shares the same caches. Each processing
//! stream gets its own [`Session`] via [`Processor::session`].

mod builder;
pub mod session;

pub use builder::{Mimir, ProcessorBuilder};
pub use session::Session;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{EmbeddingCache, SemanticCache};
use crate::providers::EmbeddingProvider;

/// Default minimum cosine similarity (inclusive) for a semantic cache hit.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Status code carried by immediate responses replayed from the cache.
pub const CACHE_HIT_STATUS: u16 = 200;

/// Shared state behind every session.
#[derive(Clone)]
pub struct Processor {
    embeddings: Arc<EmbeddingCache>,
    semantic: Arc<SemanticCache>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    threshold: f64,
}

impl Processor {
    pub(crate) fn new(
        embeddings: Arc<EmbeddingCache>,
        semantic: Arc<SemanticCache>,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        threshold: f64,
    ) -> Self {
        Self {
            embeddings,
            semantic,
            provider,
            threshold,
        }
    }

    /// Start a new session for one processing stream.
    pub fn session(&self) -> Session {
        Session::new(self.clone())
    }

    pub fn embedding_cache(&self) -> &Arc<EmbeddingCache> {
        &self.embeddings
    }

    pub fn semantic_cache(&self) -> &Arc<SemanticCache> {
        &self.semantic
    }

    /// Minimum similarity score (inclusive) for a cache hit.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether an embedding provider is configured.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Resolve the embedding for a prompt: memo first, then the provider.
    ///
    /// Provider failures are logged and reported as `None`; they never
    /// fail the session.
    pub(crate) async fn embedding_for(&self, prompt: &str) -> Option<Arc<[f64]>> {
        if let Some(embedding) = self.embeddings.get(prompt) {
            debug!(dimensions = embedding.len(), "embedding cache hit");
            return Some(embedding);
        }

        let provider = self.provider.as_ref()?;
        debug!(provider = provider.name(), "embedding cache miss, fetching");
        match provider.embed(prompt).await {
            Ok(values) => {
                let embedding: Arc<[f64]> = values.into();
                self.embeddings.insert(prompt, Arc::clone(&embedding));
                debug!(dimensions = embedding.len(), "stored new embedding");
                Some(embedding)
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "embedding unavailable");
                None
            }
        }
    }
}
