//! Append-only semantic response cache.
//!
//! # Locking
//!
//! [`SemanticCache::search`] and [`SemanticCache::insert`] both run under
//! one exclusive [`Mutex`] shared by all sessions. A search holds the lock
//! for its entire linear scan, an insert for its append, so each search
//! sees every insert that completed before it acquired the lock.
//!
//! This makes the cache a throughput ceiling: scan time grows with entry
//! count and is paid while every other session waits. Sharding or an
//! indexed nearest-neighbour structure would lift it, at the cost of the
//! serialisable ordering described above.
//!
//! The lock is synchronous and never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::similarity;
use crate::telemetry;

/// A captured response, keyed by the embedding of the prompt that
/// produced it. Immutable once inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub prompt: String,
    pub embedding: Arc<[f64]>,
    pub response: Vec<u8>,
    pub created_at: SystemTime,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(prompt: impl Into<String>, embedding: Arc<[f64]>, response: Vec<u8>) -> Self {
        Self {
            prompt: prompt.into(),
            embedding,
            response,
            created_at: SystemTime::now(),
        }
    }

    /// Whether this entry carries a response body that can be replayed.
    pub fn has_response(&self) -> bool {
        !self.response.is_empty()
    }
}

/// Outcome of [`SemanticCache::search`].
#[derive(Debug, Clone, Default)]
pub struct SemanticMatch {
    /// Best-scoring entry, if any entry scored above zero.
    pub entry: Option<Arc<CacheEntry>>,
    /// Cosine similarity of `entry`, or `0.0` when there is none.
    pub score: f64,
}

/// Process-wide store of captured responses.
///
/// Entries are never updated or removed. See module docs for the
/// concurrency model.
pub struct SemanticCache {
    entries: Mutex<Vec<Arc<CacheEntry>>>,
}

impl SemanticCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Find the entry whose embedding is most similar to `query`.
    ///
    /// Ties at the maximum score resolve to the earliest inserted entry.
    /// An empty cache yields `entry: None, score: 0.0`.
    pub fn search(&self, query: &[f64]) -> SemanticMatch {
        let entries = self.lock();
        let (entry, score) =
            similarity::best_match(query, entries.iter(), |entry| &entry.embedding[..]);
        SemanticMatch {
            entry: entry.map(Arc::clone),
            score,
        }
    }

    /// Append an entry.
    pub fn insert(&self, entry: CacheEntry) {
        let mut entries = self.lock();
        entries.push(Arc::new(entry));
        metrics::gauge!(telemetry::SEMANTIC_CACHE_ENTRIES).set(entries.len() as f64);
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are append-only and pushed whole, so a holder that panicked
    // cannot have left the vector half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<Arc<CacheEntry>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SemanticCache {
    fn default() -> Self {
        Self::new()
    }
}
