//! Error types for the studio engine

use thiserror::Error;

/// Result type alias using StudioError
pub type Result<T> = std::result::Result<T, StudioError>;

/// Errors that can occur in the studio engine
///
/// Graph store mutations never surface these to their callers; they are
/// logged and the mutation degrades to a no-op. Only snapshot handling and
/// session lookup return them.
#[derive(Debug, Error)]
pub enum StudioError {
    /// A connection could not be turned into an edge
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// The editor session was never created or has already been closed
    #[error("Editor session '{0}' is not provisioned")]
    SessionNotProvisioned(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),
}

impl StudioError {
    /// Create an invalid connection error with a message
    pub fn invalid_connection(msg: impl Into<String>) -> Self {
        Self::InvalidConnection(msg.into())
    }
}
