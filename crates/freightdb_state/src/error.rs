//! Error types for state backend operations.

use std::io;
use thiserror::Error;

/// Result type for state backend operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while talking to a state backend.
#[derive(Debug, Error)]
pub enum StateError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The persisted state is corrupted.
    #[error("state corrupted: {0}")]
    Corrupted(String),

    /// The state file is locked by another process.
    #[error("state locked: another process has exclusive access")]
    Locked,

    /// The backend does not implement an optional capability.
    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    /// The backend rejected or failed the operation.
    #[error("backend failure on key {key:?}: {message}")]
    Failed {
        /// The key the operation targeted.
        key: String,
        /// Description of the failure.
        message: String,
    },
}

impl StateError {
    /// Creates a failure for the given key.
    pub fn failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            key: key.into(),
            message: message.into(),
        }
    }
}
