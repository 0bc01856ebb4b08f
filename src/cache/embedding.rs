//! Exact-match embedding memo.

use std::sync::Arc;

use moka::sync::Cache;

use crate::telemetry;

/// Thread-safe memo from prompt text to embedding vector.
///
/// Keyed on the exact prompt string: no normalisation, no fuzziness.
/// Backed by moka without a capacity or TTL, so entries live for the
/// whole process. Values are immutable `Arc<[f64]>`, swapped in whole;
/// a reader sees either no vector or a complete one.
///
/// Two sessions racing on the same uncached prompt both call the
/// embedding service and the last insert wins. The values are identical,
/// so the race only costs a duplicate request.
pub struct EmbeddingCache {
    entries: Cache<String, Arc<[f64]>>,
}

impl EmbeddingCache {
    /// Create an empty, unbounded cache.
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    /// Look up the embedding for a prompt.
    ///
    /// Returns `None` on cache miss. Emits hit/miss metrics.
    pub fn get(&self, prompt: &str) -> Option<Arc<[f64]>> {
        match self.entries.get(prompt) {
            Some(embedding) => {
                metrics::counter!(telemetry::EMBEDDING_CACHE_HITS_TOTAL).increment(1);
                Some(embedding)
            }
            None => {
                metrics::counter!(telemetry::EMBEDDING_CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Insert (or overwrite) the embedding for a prompt.
    pub fn insert(&self, prompt: impl Into<String>, embedding: Arc<[f64]>) {
        self.entries.insert(prompt.into(), embedding);
    }

    /// Number of memoised prompts.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    /// Whether the memo is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}
