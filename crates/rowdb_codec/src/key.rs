//! Key shapes and the order-preserving key codec.

use crate::error::{CodecError, CodecResult};
use crate::field::{FieldKind, FieldValue};
use std::cmp::Ordering;

/// One slot of a key shape: a field name and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyField {
    name: String,
    kind: FieldKind,
}

impl KeyField {
    /// Creates a key field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// Encoder/decoder/comparator for keys of one fixed shape.
///
/// A key shape is an ordered list of [`KeyField`] slots. The codec
/// guarantees that for any two keys `a`, `b` of the shape,
/// `compare(a, b)` equals the lexicographic byte comparison of
/// `encode(a)` and `encode(b)`, and that a partial key (a prefix of
/// the shape) encodes to a byte prefix of every full key extending
/// it. `encode(&[])` is the empty prefix.
///
/// The final slot of the shape is the *terminal* slot; variable-width
/// kinds (`Str`, `Bytes`) encode without a terminator there because
/// nothing follows them.
#[derive(Debug, Clone)]
pub struct KeyCodec {
    fields: Vec<KeyField>,
}

impl KeyCodec {
    /// Creates a codec for the given shape.
    #[must_use]
    pub fn new(fields: Vec<KeyField>) -> Self {
        Self { fields }
    }

    /// Returns the key shape.
    #[must_use]
    pub fn fields(&self) -> &[KeyField] {
        &self.fields
    }

    /// Returns the number of slots in the shape.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Encodes a full or partial key.
    ///
    /// `values` may be any prefix of the shape; supplying more values
    /// than the shape has slots is an error, as is a value whose kind
    /// does not match its slot.
    pub fn encode(&self, values: &[FieldValue]) -> CodecResult<Vec<u8>> {
        self.check_prefix(values)?;

        let mut buf = Vec::with_capacity(values.len() * 9);
        for (i, value) in values.iter().enumerate() {
            let terminal = i + 1 == self.fields.len();
            encode_value(&self.fields[i], value, terminal, &mut buf)?;
        }
        Ok(buf)
    }

    /// Decodes a full key.
    ///
    /// Fails if the bytes end before every slot is decoded or if
    /// bytes remain after the final slot.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<Vec<FieldValue>> {
        let mut pos = 0usize;
        let mut values = Vec::with_capacity(self.fields.len());

        for (i, field) in self.fields.iter().enumerate() {
            let terminal = i + 1 == self.fields.len();
            let value = decode_value(field, terminal, bytes, &mut pos)?;
            values.push(value);
        }

        if pos != bytes.len() {
            return Err(CodecError::TrailingBytes {
                arity: self.fields.len(),
            });
        }

        Ok(values)
    }

    /// Compares two keys of this shape.
    ///
    /// Both keys must be valid (possibly partial) keys of the shape;
    /// a proper prefix orders before every key extending it. The
    /// result always matches byte comparison of the encodings.
    #[must_use]
    pub fn compare(&self, a: &[FieldValue], b: &[FieldValue]) -> Ordering {
        for (i, (av, bv)) in a.iter().zip(b.iter()).enumerate() {
            let terminal = i + 1 == self.fields.len();
            let ord = compare_values(av, bv, terminal);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.len().cmp(&b.len())
    }

    /// Validates a start/end pair for range iteration.
    ///
    /// Each key must be a valid (possibly empty) prefix of the shape,
    /// and when both are non-empty, `start` must not order after
    /// `end`. This runs before any store access.
    pub fn check_valid_range_keys(
        &self,
        start: &[FieldValue],
        end: &[FieldValue],
    ) -> CodecResult<()> {
        self.check_prefix(start)?;
        self.check_prefix(end)?;

        if !start.is_empty()
            && !end.is_empty()
            && self.compare(start, end) == Ordering::Greater
        {
            return Err(CodecError::invalid_range(
                "start key is greater than end key",
            ));
        }

        Ok(())
    }

    /// Checks that `values` is a valid prefix of the shape.
    fn check_prefix(&self, values: &[FieldValue]) -> CodecResult<()> {
        if values.len() > self.fields.len() {
            return Err(CodecError::TooManyValues {
                arity: self.fields.len(),
                supplied: values.len(),
            });
        }

        for (field, value) in self.fields.iter().zip(values.iter()) {
            if value.kind() != field.kind {
                return Err(CodecError::UnexpectedField {
                    field: field.name.clone(),
                    expected: field.kind,
                    actual: value.kind(),
                });
            }
        }

        Ok(())
    }
}

fn encode_value(
    field: &KeyField,
    value: &FieldValue,
    terminal: bool,
    buf: &mut Vec<u8>,
) -> CodecResult<()> {
    match value {
        FieldValue::Bool(b) => buf.push(u8::from(*b)),
        FieldValue::Uint32(n) => buf.extend_from_slice(&n.to_be_bytes()),
        FieldValue::Uint64(n) => buf.extend_from_slice(&n.to_be_bytes()),
        // Flipping the sign bit maps i64 order onto unsigned byte order.
        FieldValue::Int64(n) => buf.extend_from_slice(&(*n as u64 ^ SIGN64).to_be_bytes()),
        FieldValue::Enum(n) => buf.extend_from_slice(&(*n as u32 ^ SIGN32).to_be_bytes()),
        FieldValue::Str(s) => {
            if !terminal && s.as_bytes().contains(&0) {
                return Err(CodecError::invalid_string(
                    &field.name,
                    "interior NUL in non-terminal string",
                ));
            }
            buf.extend_from_slice(s.as_bytes());
            if !terminal {
                buf.push(0);
            }
        }
        FieldValue::Bytes(b) => {
            if terminal {
                buf.extend_from_slice(b);
            } else {
                let len = u8::try_from(b.len()).map_err(|_| CodecError::OversizedBytes {
                    field: field.name.clone(),
                    len: b.len(),
                })?;
                buf.push(len);
                buf.extend_from_slice(b);
            }
        }
    }
    Ok(())
}

fn decode_value(
    field: &KeyField,
    terminal: bool,
    bytes: &[u8],
    pos: &mut usize,
) -> CodecResult<FieldValue> {
    let rest = &bytes[*pos..];
    match field.kind {
        FieldKind::Bool => {
            let b = take(field, rest, 1)?;
            *pos += 1;
            match b[0] {
                0 => Ok(FieldValue::Bool(false)),
                1 => Ok(FieldValue::Bool(true)),
                other => Err(CodecError::malformed(
                    &field.name,
                    format!("invalid bool byte {other:#04x}"),
                )),
            }
        }
        FieldKind::Uint32 => {
            let b = take(field, rest, 4)?;
            *pos += 4;
            Ok(FieldValue::Uint32(u32::from_be_bytes(
                b.try_into().expect("length checked"),
            )))
        }
        FieldKind::Uint64 => {
            let b = take(field, rest, 8)?;
            *pos += 8;
            Ok(FieldValue::Uint64(u64::from_be_bytes(
                b.try_into().expect("length checked"),
            )))
        }
        FieldKind::Int64 => {
            let b = take(field, rest, 8)?;
            *pos += 8;
            let raw = u64::from_be_bytes(b.try_into().expect("length checked"));
            Ok(FieldValue::Int64((raw ^ SIGN64) as i64))
        }
        FieldKind::Enum => {
            let b = take(field, rest, 4)?;
            *pos += 4;
            let raw = u32::from_be_bytes(b.try_into().expect("length checked"));
            Ok(FieldValue::Enum((raw ^ SIGN32) as i32))
        }
        FieldKind::Str => {
            let raw = if terminal {
                *pos += rest.len();
                rest
            } else {
                let nul = rest.iter().position(|&b| b == 0).ok_or_else(|| {
                    CodecError::Truncated {
                        field: field.name.clone(),
                    }
                })?;
                *pos += nul + 1;
                &rest[..nul]
            };
            let s = std::str::from_utf8(raw)
                .map_err(|e| CodecError::invalid_string(&field.name, e.to_string()))?;
            Ok(FieldValue::Str(s.to_string()))
        }
        FieldKind::Bytes => {
            if terminal {
                *pos += rest.len();
                Ok(FieldValue::Bytes(rest.to_vec()))
            } else {
                let len = take(field, rest, 1)?[0] as usize;
                let b = take(field, &rest[1..], len)?;
                *pos += 1 + len;
                Ok(FieldValue::Bytes(b.to_vec()))
            }
        }
    }
}

/// Returns the first `len` bytes of `rest`, or a truncation error.
fn take<'a>(field: &KeyField, rest: &'a [u8], len: usize) -> CodecResult<&'a [u8]> {
    if rest.len() < len {
        return Err(CodecError::Truncated {
            field: field.name.clone(),
        });
    }
    Ok(&rest[..len])
}

/// Compares two values occupying the same key slot.
///
/// Non-terminal byte strings are length-prefixed on the wire, so they
/// compare length-first; everything else compares naturally.
fn compare_values(a: &FieldValue, b: &FieldValue, terminal: bool) -> Ordering {
    match (a, b) {
        (FieldValue::Bool(x), FieldValue::Bool(y)) => x.cmp(y),
        (FieldValue::Uint32(x), FieldValue::Uint32(y)) => x.cmp(y),
        (FieldValue::Uint64(x), FieldValue::Uint64(y)) => x.cmp(y),
        (FieldValue::Int64(x), FieldValue::Int64(y)) => x.cmp(y),
        (FieldValue::Enum(x), FieldValue::Enum(y)) => x.cmp(y),
        (FieldValue::Str(x), FieldValue::Str(y)) => x.as_bytes().cmp(y.as_bytes()),
        (FieldValue::Bytes(x), FieldValue::Bytes(y)) => {
            if terminal {
                x.cmp(y)
            } else {
                match x.len().cmp(&y.len()) {
                    Ordering::Equal => x.cmp(y),
                    ord => ord,
                }
            }
        }
        // Mismatched kinds never occur on validated keys; fall back to
        // a stable order so compare stays total.
        _ => a.kind().cmp(&b.kind()),
    }
}

const SIGN64: u64 = 1 << 63;
const SIGN32: u32 = 1 << 31;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pair_codec() -> KeyCodec {
        KeyCodec::new(vec![
            KeyField::new("name", FieldKind::Str),
            KeyField::new("id", FieldKind::Uint64),
        ])
    }

    #[test]
    fn encode_empty_key_is_empty_prefix() {
        let codec = pair_codec();
        assert!(codec.encode(&[]).unwrap().is_empty());
    }

    #[test]
    fn uint_encodings_are_big_endian() {
        let codec = KeyCodec::new(vec![
            KeyField::new("a", FieldKind::Uint32),
            KeyField::new("b", FieldKind::Uint64),
        ]);
        let bytes = codec
            .encode(&[FieldValue::Uint32(1), FieldValue::Uint64(2)])
            .unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn int64_negative_sorts_before_positive() {
        let codec = KeyCodec::new(vec![KeyField::new("v", FieldKind::Int64)]);
        let neg = codec.encode(&[FieldValue::Int64(-5)]).unwrap();
        let zero = codec.encode(&[FieldValue::Int64(0)]).unwrap();
        let pos = codec.encode(&[FieldValue::Int64(5)]).unwrap();
        assert!(neg < zero);
        assert!(zero < pos);
    }

    #[test]
    fn enum_negative_sorts_before_positive() {
        let codec = KeyCodec::new(vec![KeyField::new("v", FieldKind::Enum)]);
        let neg = codec.encode(&[FieldValue::Enum(-1)]).unwrap();
        let pos = codec.encode(&[FieldValue::Enum(1)]).unwrap();
        assert!(neg < pos);
    }

    #[test]
    fn terminal_string_is_raw() {
        let codec = KeyCodec::new(vec![KeyField::new("s", FieldKind::Str)]);
        let bytes = codec.encode(&[FieldValue::from("ab")]).unwrap();
        assert_eq!(bytes, b"ab");
    }

    #[test]
    fn non_terminal_string_is_nul_terminated() {
        let codec = pair_codec();
        let bytes = codec
            .encode(&[FieldValue::from("ab"), FieldValue::Uint64(1)])
            .unwrap();
        assert_eq!(&bytes[..3], &[b'a', b'b', 0]);
    }

    #[test]
    fn non_terminal_string_rejects_interior_nul() {
        let codec = pair_codec();
        let err = codec
            .encode(&[FieldValue::from("a\0b"), FieldValue::Uint64(1)])
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidString { .. }));
    }

    #[test]
    fn terminal_string_allows_nul() {
        let codec = KeyCodec::new(vec![KeyField::new("s", FieldKind::Str)]);
        let key = vec![FieldValue::from("a\0b")];
        let bytes = codec.encode(&key).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), key);
    }

    #[test]
    fn non_terminal_bytes_are_length_prefixed() {
        let codec = KeyCodec::new(vec![
            KeyField::new("b", FieldKind::Bytes),
            KeyField::new("id", FieldKind::Uint32),
        ]);
        let bytes = codec
            .encode(&[FieldValue::from(vec![9u8, 8]), FieldValue::Uint32(1)])
            .unwrap();
        assert_eq!(&bytes[..3], &[2, 9, 8]);
    }

    #[test]
    fn non_terminal_bytes_over_255_rejected() {
        let codec = KeyCodec::new(vec![
            KeyField::new("b", FieldKind::Bytes),
            KeyField::new("id", FieldKind::Uint32),
        ]);
        let err = codec
            .encode(&[FieldValue::from(vec![0u8; 256]), FieldValue::Uint32(1)])
            .unwrap_err();
        assert!(matches!(err, CodecError::OversizedBytes { len: 256, .. }));
    }

    #[test]
    fn terminal_bytes_are_raw() {
        let codec = KeyCodec::new(vec![KeyField::new("b", FieldKind::Bytes)]);
        let key = vec![FieldValue::from(vec![0u8; 300])];
        let bytes = codec.encode(&key).unwrap();
        assert_eq!(bytes.len(), 300);
        assert_eq!(codec.decode(&bytes).unwrap(), key);
    }

    #[test]
    fn partial_key_is_byte_prefix_of_full_key() {
        let codec = pair_codec();
        let partial = codec.encode(&[FieldValue::from("a")]).unwrap();
        let full = codec
            .encode(&[FieldValue::from("a"), FieldValue::Uint64(7)])
            .unwrap();
        assert!(full.starts_with(&partial));
    }

    #[test]
    fn decode_round_trip() {
        let codec = KeyCodec::new(vec![
            KeyField::new("flag", FieldKind::Bool),
            KeyField::new("n", FieldKind::Int64),
            KeyField::new("name", FieldKind::Str),
            KeyField::new("tail", FieldKind::Bytes),
        ]);
        let key = vec![
            FieldValue::Bool(true),
            FieldValue::Int64(-42),
            FieldValue::from("x"),
            FieldValue::from(vec![1u8, 2, 3]),
        ];
        let bytes = codec.encode(&key).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), key);
    }

    #[test]
    fn decode_truncated_fails() {
        let codec = KeyCodec::new(vec![KeyField::new("n", FieldKind::Uint64)]);
        let err = codec.decode(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }

    #[test]
    fn decode_trailing_bytes_fails() {
        let codec = KeyCodec::new(vec![KeyField::new("n", FieldKind::Uint32)]);
        let err = codec.decode(&[0, 0, 0, 1, 99]).unwrap_err();
        assert!(matches!(err, CodecError::TrailingBytes { .. }));
    }

    #[test]
    fn decode_invalid_bool_fails() {
        let codec = KeyCodec::new(vec![KeyField::new("b", FieldKind::Bool)]);
        let err = codec.decode(&[2]).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
    }

    #[test]
    fn encode_wrong_kind_fails() {
        let codec = pair_codec();
        let err = codec.encode(&[FieldValue::Uint64(1)]).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedField { .. }));
    }

    #[test]
    fn encode_too_many_values_fails() {
        let codec = KeyCodec::new(vec![KeyField::new("n", FieldKind::Uint32)]);
        let err = codec
            .encode(&[FieldValue::Uint32(1), FieldValue::Uint32(2)])
            .unwrap_err();
        assert!(matches!(err, CodecError::TooManyValues { .. }));
    }

    #[test]
    fn compare_prefix_orders_before_extension() {
        let codec = pair_codec();
        let short = vec![FieldValue::from("a")];
        let long = vec![FieldValue::from("a"), FieldValue::Uint64(0)];
        assert_eq!(codec.compare(&short, &long), Ordering::Less);
    }

    #[test]
    fn valid_range_keys_accepted() {
        let codec = pair_codec();
        codec
            .check_valid_range_keys(&[FieldValue::from("a")], &[FieldValue::from("b")])
            .unwrap();
        // empty bounds are always valid
        codec.check_valid_range_keys(&[], &[]).unwrap();
        codec
            .check_valid_range_keys(&[], &[FieldValue::from("z")])
            .unwrap();
    }

    #[test]
    fn inverted_range_keys_rejected() {
        let codec = pair_codec();
        let err = codec
            .check_valid_range_keys(&[FieldValue::from("b")], &[FieldValue::from("a")])
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidRange { .. }));
    }

    #[test]
    fn range_keys_with_wrong_kind_rejected() {
        let codec = pair_codec();
        let err = codec
            .check_valid_range_keys(&[FieldValue::Uint64(1)], &[])
            .unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedField { .. }));
    }

    fn sample_value(kind: FieldKind) -> BoxedStrategy<FieldValue> {
        match kind {
            FieldKind::Bool => any::<bool>().prop_map(FieldValue::Bool).boxed(),
            FieldKind::Uint32 => any::<u32>().prop_map(FieldValue::Uint32).boxed(),
            FieldKind::Uint64 => any::<u64>().prop_map(FieldValue::Uint64).boxed(),
            FieldKind::Int64 => any::<i64>().prop_map(FieldValue::Int64).boxed(),
            FieldKind::Enum => any::<i32>().prop_map(FieldValue::Enum).boxed(),
            FieldKind::Str => "[a-m]{0,6}".prop_map(FieldValue::from).boxed(),
            FieldKind::Bytes => proptest::collection::vec(any::<u8>(), 0..6)
                .prop_map(FieldValue::from)
                .boxed(),
        }
    }

    /// A mixed shape exercising every non-terminal/terminal rule.
    fn mixed_shape() -> (KeyCodec, impl Strategy<Value = Vec<FieldValue>>) {
        let kinds = [
            FieldKind::Bool,
            FieldKind::Int64,
            FieldKind::Str,
            FieldKind::Bytes,
            FieldKind::Uint32,
        ];
        let codec = KeyCodec::new(
            kinds
                .iter()
                .enumerate()
                .map(|(i, k)| KeyField::new(format!("f{i}"), *k))
                .collect(),
        );
        let strategy = kinds.iter().map(|k| sample_value(*k)).collect::<Vec<_>>();
        (codec, strategy)
    }

    proptest! {
        #[test]
        fn prop_round_trip(key in mixed_shape().1) {
            let (codec, _) = mixed_shape();
            let bytes = codec.encode(&key).unwrap();
            prop_assert_eq!(codec.decode(&bytes).unwrap(), key);
        }

        #[test]
        fn prop_order_preservation(a in mixed_shape().1, b in mixed_shape().1) {
            let (codec, _) = mixed_shape();
            let ea = codec.encode(&a).unwrap();
            let eb = codec.encode(&b).unwrap();
            prop_assert_eq!(codec.compare(&a, &b), ea.cmp(&eb));
        }

        #[test]
        fn prop_prefix_containment(key in mixed_shape().1, cut in 0usize..=5) {
            let (codec, _) = mixed_shape();
            let partial = codec.encode(&key[..cut]).unwrap();
            let full = codec.encode(&key).unwrap();
            prop_assert!(full.starts_with(&partial));
        }
    }
}
