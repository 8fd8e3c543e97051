//! Error types for FreightDB core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The four failure classes every repository operation reports.
///
/// Callers (routers, transports) that only need to know what went wrong at
/// the contract level match on this rather than on [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A missing, empty, reserved or unknown argument.
    InvalidArgument,
    /// Create on an identifier that already holds a record.
    AlreadyExists,
    /// Read or update of an identifier with no record.
    NotFound,
    /// Any failure of, or inconsistency in, the state backend.
    Backend,
}

/// Errors that can occur in FreightDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// State backend error.
    #[error("state error: {0}")]
    State(#[from] freightdb_state::StateError),

    /// Payload codec error.
    #[error("codec error: {0}")]
    Codec(#[from] freightdb_codec::CodecError),

    /// An argument failed validation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// A record already exists under the identifier.
    #[error("record already exists: {id}")]
    AlreadyExists {
        /// The identifier that is taken.
        id: String,
    },

    /// No record exists under the identifier.
    #[error("record not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// A stored value decoded as CBOR but does not fit the schema.
    #[error("invalid payload: {message}")]
    InvalidPayload {
        /// Description of the mismatch.
        message: String,
    },

    /// The optimistic index update kept losing to concurrent writers.
    #[error("index {key} still contended after {attempts} attempts")]
    IndexContention {
        /// The index key.
        key: String,
        /// Number of read-modify-write attempts made.
        attempts: u32,
    },

    /// A schema or repository configuration is unusable.
    #[error("invalid schema: {message}")]
    InvalidSchema {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(id: impl Into<String>) -> Self {
        Self::AlreadyExists { id: id.into() }
    }

    /// Creates a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates an invalid payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Maps this error onto the repository's failure classes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidArgument { .. } | CoreError::InvalidSchema { .. } => {
                ErrorKind::InvalidArgument
            }
            CoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::State(_)
            | CoreError::Codec(_)
            | CoreError::InvalidPayload { .. }
            | CoreError::IndexContention { .. } => ErrorKind::Backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freightdb_codec::CodecError;
    use freightdb_state::StateError;

    #[test]
    fn error_classification() {
        assert_eq!(
            CoreError::invalid_argument("empty id").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            CoreError::invalid_schema("dup field").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(CoreError::already_exists("L1").kind(), ErrorKind::AlreadyExists);
        assert_eq!(CoreError::not_found("L9").kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::from(StateError::failed("L1", "disk full")).kind(),
            ErrorKind::Backend
        );
        assert_eq!(
            CoreError::from(CodecError::UnexpectedEof).kind(),
            ErrorKind::Backend
        );
        assert_eq!(
            CoreError::IndexContention {
                key: "_idx".into(),
                attempts: 3
            }
            .kind(),
            ErrorKind::Backend
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(
            CoreError::already_exists("L1").to_string(),
            "record already exists: L1"
        );
        let msg = CoreError::from(StateError::failed("L1", "disk full")).to_string();
        assert!(msg.contains("disk full"));
    }
}
