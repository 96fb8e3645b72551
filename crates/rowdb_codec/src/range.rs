//! Range-bound byte arithmetic and the index sentinel.

/// The reserved one-byte value marking "entry exists, no payload" in
/// non-unique index entries.
///
/// Non-unique index entries carry all their information in the key;
/// the sentinel only makes the entry visible to point lookups on
/// stores that cannot represent truly empty values.
pub const SENTINEL: &[u8] = &[0];

/// Returns the smallest byte string greater than every string having
/// `prefix` as a prefix.
///
/// This is the exclusive upper bound for a prefix scan: increment the
/// last non-`0xFF` byte and truncate everything after it. Returns
/// `None` when no such string exists (empty prefix or all bytes
/// `0xFF`), which callers treat as an unbounded scan.
#[must_use]
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    if prefix.is_empty() {
        return None;
    }

    let mut end = prefix.to_vec();
    while let Some(&last) = end.last() {
        if last == 0xFF {
            end.pop();
        } else {
            *end.last_mut().expect("non-empty") += 1;
            return Some(end);
        }
    }

    None
}
