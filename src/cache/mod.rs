//! Caching subsystem.
//!
//! Two independent, process-wide caches shared by every ext_proc session:
//!
//! - [`EmbeddingCache`]: exact-match memo from prompt text to its
//!   embedding vector. Avoids calling the embedding service twice for the
//!   same prompt.
//!
//! - [`SemanticCache`]: append-only store of captured responses, searched
//!   by cosine similarity of prompt embeddings. See [`semantic`] module
//!   docs for the locking discipline.
//!
//! Neither cache evicts. Both grow for the lifetime of the process.

pub mod embedding;
pub mod semantic;

pub use embedding::EmbeddingCache;
pub use semantic::{CacheEntry, SemanticCache, SemanticMatch};
