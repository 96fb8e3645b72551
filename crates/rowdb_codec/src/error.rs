//! Error types for key encoding.

use crate::field::FieldKind;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding keys.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A value's kind does not match its key slot.
    #[error("field {field}: expected {expected:?}, got {actual:?}")]
    UnexpectedField {
        /// Name of the key slot.
        field: String,
        /// Kind declared by the key shape.
        expected: FieldKind,
        /// Kind of the supplied value.
        actual: FieldKind,
    },

    /// More values were supplied than the key shape has slots.
    #[error("too many values: key shape has {arity} slots, got {supplied}")]
    TooManyValues {
        /// Number of slots in the shape.
        arity: usize,
        /// Number of values supplied.
        supplied: usize,
    },

    /// A string value cannot be encoded or decoded.
    #[error("invalid string in field {field}: {message}")]
    InvalidString {
        /// Name of the key slot.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// A byte value exceeds the non-terminal length limit.
    #[error("field {field}: byte value of {len} bytes exceeds the 255-byte limit")]
    OversizedBytes {
        /// Name of the key slot.
        field: String,
        /// Length of the offending value.
        len: usize,
    },

    /// The encoded key ended before all slots were decoded.
    #[error("truncated key: ended while decoding field {field}")]
    Truncated {
        /// Name of the key slot being decoded.
        field: String,
    },

    /// An encoded field holds bytes no value of its kind produces.
    #[error("malformed encoding in field {field}: {message}")]
    Malformed {
        /// Name of the key slot.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// The encoded key has bytes left over after the final slot.
    #[error("trailing bytes after decoding key of {arity} fields")]
    TrailingBytes {
        /// Number of slots in the shape.
        arity: usize,
    },

    /// A start/end pair is invalid for range iteration.
    #[error("invalid range: {message}")]
    InvalidRange {
        /// Description of the violation.
        message: String,
    },
}

impl CodecError {
    /// Creates an invalid range error.
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Creates an invalid string error.
    pub fn invalid_string(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidString {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed encoding error.
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            field: field.into(),
            message: message.into(),
        }
    }
}
