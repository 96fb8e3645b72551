//! Typed field values and their kinds.

/// The kind of a key field.
///
/// Every slot of a key shape declares one of these kinds, and every
/// value supplied for that slot must match it. The set is closed:
/// each kind has a fixed order-preserving byte encoding defined in
/// [`KeyCodec`](crate::KeyCodec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    /// Boolean, one byte.
    Bool,
    /// Unsigned 32-bit integer, big-endian.
    Uint32,
    /// Unsigned 64-bit integer, big-endian.
    Uint64,
    /// Signed 64-bit integer, sign-bit-flipped big-endian.
    Int64,
    /// Enum discriminant (i32), sign-bit-flipped big-endian.
    Enum,
    /// UTF-8 string.
    Str,
    /// Raw byte string.
    Bytes,
}

/// A typed field value extracted from a record.
///
/// Values of the same kind have a total order consistent with the
/// byte-lexicographic order of their encodings; the codec relies on
/// this when comparing keys slot by slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Boolean value.
    Bool(bool),
    /// Unsigned 32-bit integer.
    Uint32(u32),
    /// Unsigned 64-bit integer.
    Uint64(u64),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Enum discriminant.
    Enum(i32),
    /// UTF-8 string.
    Str(String),
    /// Raw byte string.
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Uint32(_) => FieldKind::Uint32,
            FieldValue::Uint64(_) => FieldKind::Uint64,
            FieldValue::Int64(_) => FieldKind::Int64,
            FieldValue::Enum(_) => FieldKind::Enum,
            FieldValue::Str(_) => FieldKind::Str,
            FieldValue::Bytes(_) => FieldKind::Bytes,
        }
    }

    /// Gets this value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Gets this value as a u32, if it is one.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::Uint32(n) => Some(*n),
            _ => None,
        }
    }

    /// Gets this value as a u64, if it is one.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Uint64(n) => Some(*n),
            _ => None,
        }
    }

    /// Gets this value as an i64, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Gets this value as an enum discriminant, if it is one.
    #[must_use]
    pub fn as_enum(&self) -> Option<i32> {
        match self {
            FieldValue::Enum(n) => Some(*n),
            _ => None,
        }
    }

    /// Gets this value as a string slice, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Gets this value as a byte slice, if it is a byte string.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Uint32(n)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Uint64(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int64(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(b: Vec<u8>) -> Self {
        FieldValue::Bytes(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(FieldValue::Bool(true).kind(), FieldKind::Bool);
        assert_eq!(FieldValue::Uint32(1).kind(), FieldKind::Uint32);
        assert_eq!(FieldValue::Uint64(1).kind(), FieldKind::Uint64);
        assert_eq!(FieldValue::Int64(-1).kind(), FieldKind::Int64);
        assert_eq!(FieldValue::Enum(2).kind(), FieldKind::Enum);
        assert_eq!(FieldValue::from("x").kind(), FieldKind::Str);
        assert_eq!(FieldValue::from(vec![1u8]).kind(), FieldKind::Bytes);
    }

    #[test]
    fn accessors() {
        assert_eq!(FieldValue::Bool(true).as_bool(), Some(true));
        assert_eq!(FieldValue::Uint64(7).as_u64(), Some(7));
        assert_eq!(FieldValue::Uint64(7).as_str(), None);
        assert_eq!(FieldValue::from("hi").as_str(), Some("hi"));
        assert_eq!(
            FieldValue::from(vec![1u8, 2]).as_bytes(),
            Some(&[1u8, 2][..])
        );
    }

    #[test]
    fn from_impls() {
        assert_eq!(FieldValue::from(true), FieldValue::Bool(true));
        assert_eq!(FieldValue::from(3u32), FieldValue::Uint32(3));
        assert_eq!(FieldValue::from(3u64), FieldValue::Uint64(3));
        assert_eq!(FieldValue::from(-3i64), FieldValue::Int64(-3));
        assert_eq!(FieldValue::from("a"), FieldValue::Str("a".to_string()));
    }
}
