//! Secondary (non-unique) index.

use crate::error::{CoreError, CoreResult};
use crate::index::primary::PrimaryKeyIndex;
use crate::iter::{EntryResolver, IteratorOptions, RecordIterator};
use crate::record::{extract_values, Record};
use rowdb_codec::{FieldValue, KeyCodec, SENTINEL};
use rowdb_kv::{ReadStore, WriteStore};
use std::cmp::Ordering;

/// A non-unique index over a set of record fields.
///
/// Entries are keyed by `prefix ‖ encode(index_fields ++ pk_fields)`
/// and carry the one-byte sentinel as their value: existence plus key
/// recoverability is all a non-unique entry provides. Primary-key
/// fields already among the index fields are not encoded twice; a
/// positional mapping recovers the full primary key on decode.
pub struct SecondaryIndex<T: Record> {
    name: String,
    prefix: Vec<u8>,
    /// Codec over the combined shape: index fields, then the primary
    /// key fields not already among them.
    codec: KeyCodec,
    /// Number of leading slots that are index fields.
    index_arity: usize,
    /// All combined field names, for extraction from records.
    field_names: Vec<String>,
    /// For each primary key field, its slot in the combined shape.
    pk_positions: Vec<usize>,
    primary: PrimaryKeyIndex<T>,
}

impl<T: Record> SecondaryIndex<T> {
    pub(crate) fn new(
        name: String,
        prefix: Vec<u8>,
        codec: KeyCodec,
        index_arity: usize,
        field_names: Vec<String>,
        pk_positions: Vec<usize>,
        primary: PrimaryKeyIndex<T>,
    ) -> Self {
        Self {
            name,
            prefix,
            codec,
            index_arity,
            field_names,
            pk_positions,
            primary,
        }
    }

    /// Returns the index name (its field list, joined).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Writes this index's entry for a newly created record.
    pub(crate) fn on_create(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        let key = self.entry_key(record)?;
        store.set(&key, SENTINEL)?;
        Ok(())
    }

    /// Replays an update: if the index key is unchanged this is a
    /// no-op; otherwise the old entry is deleted and the new one
    /// inserted.
    pub(crate) fn on_update(&self, store: &mut dyn WriteStore, old: &T, new: &T) -> CoreResult<()> {
        let old_values = extract_values(old, &self.field_names)?;
        let new_values = extract_values(new, &self.field_names)?;
        if self.codec.compare(&new_values, &old_values) == Ordering::Equal {
            return Ok(());
        }

        let old_key = self.key_bytes(&old_values)?;
        store.delete(&old_key)?;

        let new_key = self.key_bytes(&new_values)?;
        store.set(&new_key, SENTINEL)?;
        Ok(())
    }

    /// Removes this index's entry for a deleted record.
    pub(crate) fn on_delete(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        let key = self.entry_key(record)?;
        store.delete(&key)?;
        Ok(())
    }

    /// Iterates entries whose index key starts with `key_prefix`.
    ///
    /// Ties on the index fields break in ascending primary key order,
    /// because the primary key is part of the stored key.
    pub fn prefix_iterator<'a>(
        &'a self,
        store: &'a dyn ReadStore,
        key_prefix: &[FieldValue],
        options: &IteratorOptions,
    ) -> CoreResult<RecordIterator<'a, T>> {
        let prefix = self.prefix_bytes(key_prefix)?;
        RecordIterator::prefix(self, store, &prefix, options)
    }

    /// Iterates entries with index keys in `[start, end]`; either
    /// bound may be empty.
    pub fn range_iterator<'a>(
        &'a self,
        store: &'a dyn ReadStore,
        start: &[FieldValue],
        end: &[FieldValue],
        options: &IteratorOptions,
    ) -> CoreResult<RecordIterator<'a, T>> {
        self.codec.check_valid_range_keys(start, end)?;
        let start_bytes = self.prefix_bytes(start)?;
        let end_bytes = self.prefix_bytes(end)?;
        RecordIterator::range(self, store, &start_bytes, &end_bytes, options)
    }

    /// Computes the full entry key for a record.
    fn entry_key(&self, record: &T) -> CoreResult<Vec<u8>> {
        let values = extract_values(record, &self.field_names)?;
        self.key_bytes(&values)
    }

    fn key_bytes(&self, values: &[FieldValue]) -> CoreResult<Vec<u8>> {
        self.prefix_bytes(values)
    }

    fn prefix_bytes(&self, values: &[FieldValue]) -> CoreResult<Vec<u8>> {
        let mut bytes = self.prefix.clone();
        bytes.extend_from_slice(&self.codec.encode(values)?);
        Ok(bytes)
    }
}

impl<T: Record> EntryResolver<T> for SecondaryIndex<T> {
    fn decode_entry(
        &self,
        key: &[u8],
        _value: &[u8],
    ) -> CoreResult<(Vec<FieldValue>, Vec<FieldValue>)> {
        let rest = key.strip_prefix(self.prefix.as_slice()).ok_or_else(|| {
            CoreError::index_desync(format!("entry key outside index {}", self.name))
        })?;
        let combined = self.codec.decode(rest)?;

        let index_values = combined[..self.index_arity].to_vec();
        let primary_key = self
            .pk_positions
            .iter()
            .map(|&pos| combined[pos].clone())
            .collect();
        Ok((index_values, primary_key))
    }

    fn resolve_record(
        &self,
        store: &dyn ReadStore,
        primary_key: &[FieldValue],
        _entry_value: &[u8],
    ) -> CoreResult<T> {
        self.primary.get(store, primary_key)?.ok_or_else(|| {
            CoreError::index_desync(format!(
                "index {} entry references a primary key missing from table {}",
                self.name,
                T::schema().name
            ))
        })
    }
}
