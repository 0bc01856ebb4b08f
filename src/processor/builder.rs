//! Builder for configuring processor instances

use std::sync::Arc;

use super::{DEFAULT_SIMILARITY_THRESHOLD, Processor};
use crate::cache::{EmbeddingCache, SemanticCache};
use crate::providers::{EmbeddingProvider, HttpEmbeddingClient};
use crate::{MimirError, Result};

/// Main entry point for creating processor instances.
pub struct Mimir;

impl Mimir {
    /// Create a new builder for configuring the processor.
    pub fn builder() -> ProcessorBuilder {
        ProcessorBuilder::new()
    }
}

/// Builder for configuring processor instances.
pub struct ProcessorBuilder {
    embedding_server: Option<String>,
    embedding_host: Option<String>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    threshold: f64,
    embedding_cache: Option<Arc<EmbeddingCache>>,
    semantic_cache: Option<Arc<SemanticCache>>,
}

impl ProcessorBuilder {
    pub fn new() -> Self {
        Self {
            embedding_server: None,
            embedding_host: None,
            provider: None,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            embedding_cache: None,
            semantic_cache: None,
        }
    }

    /// Embedding service endpoint. An empty URL disables embedding lookups.
    pub fn embedding_server(mut self, url: impl Into<String>) -> Self {
        self.embedding_server = Some(url.into());
        self
    }

    /// Override the `Host` header on embedding requests.
    pub fn embedding_host(mut self, host: impl Into<String>) -> Self {
        self.embedding_host = Some(host.into());
        self
    }

    /// Use a custom embedding provider instead of the HTTP client.
    ///
    /// Takes precedence over [`embedding_server`](Self::embedding_server).
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Minimum similarity score (inclusive) for a cache hit. Default: 0.75.
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Share an existing embedding memo.
    pub fn embedding_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.embedding_cache = Some(cache);
        self
    }

    /// Share an existing semantic cache.
    pub fn semantic_cache(mut self, cache: Arc<SemanticCache>) -> Self {
        self.semantic_cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Processor> {
        if !self.threshold.is_finite() {
            return Err(MimirError::Configuration(format!(
                "similarity threshold must be a finite number, got {}",
                self.threshold
            )));
        }

        let provider = match (self.provider, self.embedding_server) {
            (Some(provider), _) => Some(provider),
            (None, Some(url)) if !url.is_empty() => {
                let client = HttpEmbeddingClient::new(url, self.embedding_host)?;
                Some(Arc::new(client) as Arc<dyn EmbeddingProvider>)
            }
            (None, _) => None,
        };

        Ok(Processor::new(
            self.embedding_cache.unwrap_or_default(),
            self.semantic_cache.unwrap_or_default(),
            provider,
            self.threshold,
        ))
    }
}

impl Default for ProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
