//! Muninn error types

/// Muninn error types
#[derive(Debug, thiserror::Error)]
pub enum MuninnError {
    // Input validation errors. Display strings double as the HTTP 400
    // bodies served to callers, so the wording is load-bearing.
    #[error("Missing 'repo' or 'gitRef' query parameter")]
    MissingParameter,

    /// "latest" is mutable and would defeat the immutability guarantees
    /// the cache makes to callers.
    #[error("'latest' is not a valid value for 'gitRef'. Please use an immutable reference.")]
    MutableReference,

    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Muninn operations
pub type Result<T> = std::result::Result<T, MuninnError>;
