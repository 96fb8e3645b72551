//! Error types for store backends.

use thiserror::Error;

/// Result type for store operations.
pub type KvResult<T> = Result<T, KvError>;

/// Errors that can occur in a store backend.
#[derive(Debug, Error)]
pub enum KvError {
    /// The backend failed to service a request.
    #[error("backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },

    /// I/O error from a persistent backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KvError {
    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
