//! Telemetry metric name constants.
//!
//! Centralised metric names for mimir operations. The daemon or an
//! embedding host installs its own `metrics` recorder (e.g. prometheus);
//! without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `mimir_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `status`: outcome of an embedding request: "ok" or "error"

/// Number of ext_proc streams currently being processed.
pub const SESSIONS_ACTIVE: &str = "mimir_sessions_active";

/// Exact-match embedding memo hits.
pub const EMBEDDING_CACHE_HITS_TOTAL: &str = "mimir_embedding_cache_hits_total";

/// Exact-match embedding memo misses.
pub const EMBEDDING_CACHE_MISSES_TOTAL: &str = "mimir_embedding_cache_misses_total";

/// Prompts answered from the semantic cache with an immediate response.
pub const SEMANTIC_CACHE_HITS_TOTAL: &str = "mimir_semantic_cache_hits_total";

/// Prompts with an embedding that found no match at or above the threshold.
pub const SEMANTIC_CACHE_MISSES_TOTAL: &str = "mimir_semantic_cache_misses_total";

/// Entries currently held by the semantic cache.
pub const SEMANTIC_CACHE_ENTRIES: &str = "mimir_semantic_cache_entries";

/// Calls made to the embedding service.
///
/// Labels: `status` ("ok" | "error").
pub const EMBEDDING_REQUESTS_TOTAL: &str = "mimir_embedding_requests_total";

/// Embedding service call duration in seconds.
pub const EMBEDDING_REQUEST_DURATION_SECONDS: &str = "mimir_embedding_request_duration_seconds";
