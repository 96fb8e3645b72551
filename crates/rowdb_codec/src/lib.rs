//! # RowDB Codec
//!
//! Order-preserving key encoding for RowDB.
//!
//! This crate turns ordered sequences of typed field values into byte
//! strings whose lexicographic order matches the logical order of the
//! values. That property is the correctness backbone of every prefix
//! and range scan in the table engine: the underlying store only
//! compares raw bytes, so the encoding must make byte comparison and
//! value comparison agree.
//!
//! ## Encoding Rules
//!
//! - Integers encode big-endian; signed kinds flip the sign bit so
//!   negative values sort first
//! - Strings encode as raw UTF-8 in the final key slot, and as
//!   NUL-terminated UTF-8 elsewhere (interior NULs are rejected)
//! - Byte strings encode raw in the final slot, and length-prefixed
//!   elsewhere (at most 255 bytes)
//! - A partial key (any prefix of the shape) encodes to a byte prefix
//!   of every full key extending it
//!
//! ## Usage
//!
//! ```
//! use rowdb_codec::{FieldKind, FieldValue, KeyCodec, KeyField};
//!
//! let codec = KeyCodec::new(vec![
//!     KeyField::new("name", FieldKind::Str),
//!     KeyField::new("id", FieldKind::Uint64),
//! ]);
//!
//! let key = vec![FieldValue::from("a"), FieldValue::from(1u64)];
//! let bytes = codec.encode(&key).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), key);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod field;
mod key;
mod range;

pub use error::{CodecError, CodecResult};
pub use field::{FieldKind, FieldValue};
pub use key::{KeyCodec, KeyField};
pub use range::{prefix_end, SENTINEL};
