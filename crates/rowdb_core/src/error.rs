//! Error types for the table engine.

use thiserror::Error;

/// Result type for table engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in table engine operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Key encoding or range validation error.
    #[error("codec error: {0}")]
    Codec(#[from] rowdb_codec::CodecError),

    /// Store backend error.
    #[error("store error: {0}")]
    Kv(#[from] rowdb_kv::KvError),

    /// A unique index write collided with an existing owner.
    #[error("unique key violation on index {index}")]
    UniqueKeyViolation {
        /// Name of the violated index.
        index: String,
    },

    /// `create` was called for a primary key that already exists.
    #[error("record already exists in table {table}")]
    AlreadyExists {
        /// Name of the table.
        table: String,
    },

    /// `update` was called for a primary key that does not exist.
    #[error("record not found in table {table}")]
    NotFound {
        /// Name of the table.
        table: String,
    },

    /// An index entry references a primary key the primary key index
    /// cannot resolve. Indicates index/table desynchronization; this
    /// is a broken invariant, not a retryable condition.
    #[error("index/table desync: {message}")]
    IndexDesync {
        /// Description of the broken invariant.
        message: String,
    },

    /// A table or index definition is invalid.
    #[error("invalid schema: {message}")]
    InvalidSchema {
        /// Description of the problem.
        message: String,
    },

    /// A key supplied to a point operation has the wrong arity.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the problem.
        message: String,
    },

    /// A record payload could not be encoded or decoded.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an index desync error.
    pub fn index_desync(message: impl Into<String>) -> Self {
        Self::IndexDesync {
            message: message.into(),
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates a unique key violation for the named index.
    pub fn unique_violation(index: impl Into<String>) -> Self {
        Self::UniqueKeyViolation {
            index: index.into(),
        }
    }
}
