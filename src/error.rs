//! Mimir error types

/// Mimir error types
#[derive(Debug, thiserror::Error)]
pub enum MimirError {
    // Embedding service errors
    /// Connection failure, timeout, or non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The embedding service answered with something we cannot use.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Streaming errors
    #[error("stream error: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for MimirError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MimirError::Protocol(err.to_string())
        } else {
            MimirError::Transport(err.to_string())
        }
    }
}

/// Result type alias for Mimir operations
pub type Result<T> = std::result::Result<T, MimirError>;
