//! Unique secondary index.

use crate::error::{CoreError, CoreResult};
use crate::index::primary::PrimaryKeyIndex;
use crate::iter::{EntryResolver, IteratorOptions, RecordIterator};
use crate::record::{extract_values, Record};
use rowdb_codec::{FieldValue, KeyCodec};
use rowdb_kv::{ReadStore, WriteStore};
use std::cmp::Ordering;

/// Where each primary key field of a unique index entry lives.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PkSlot {
    /// At this position of the decoded entry key.
    Key(usize),
    /// At this position of the decoded entry value.
    Value(usize),
}

/// A unique index over a set of record fields.
///
/// At most one live record may hold a given key. Entries map
/// `prefix ‖ encode(unique_fields)` to the encoded primary key fields
/// not already among the unique fields - which may be an *empty*
/// value; existence is carried by key presence, not payload
/// non-emptiness.
pub struct UniqueIndex<T: Record> {
    name: String,
    prefix: Vec<u8>,
    key_codec: KeyCodec,
    /// Codec for the entry value: primary key fields absent from the
    /// unique key.
    value_codec: KeyCodec,
    key_field_names: Vec<String>,
    value_field_names: Vec<String>,
    /// For each primary key field, where to find it on decode.
    pk_slots: Vec<PkSlot>,
    primary: PrimaryKeyIndex<T>,
}

impl<T: Record> UniqueIndex<T> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        prefix: Vec<u8>,
        key_codec: KeyCodec,
        value_codec: KeyCodec,
        key_field_names: Vec<String>,
        value_field_names: Vec<String>,
        pk_slots: Vec<PkSlot>,
        primary: PrimaryKeyIndex<T>,
    ) -> Self {
        Self {
            name,
            prefix,
            key_codec,
            value_codec,
            key_field_names,
            value_field_names,
            pk_slots,
            primary,
        }
    }

    /// Returns the index name (its field list, joined).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether a record currently owns `key`.
    pub fn has(&self, store: &dyn ReadStore, key: &[FieldValue]) -> CoreResult<bool> {
        let key_bytes = self.full_key_bytes(key)?;
        Ok(store.has(&key_bytes)?)
    }

    /// Resolves the record owning `key`, if any.
    ///
    /// A present entry whose embedded primary key does not resolve in
    /// the primary key index is an
    /// [`IndexDesync`](CoreError::IndexDesync).
    pub fn get(&self, store: &dyn ReadStore, key: &[FieldValue]) -> CoreResult<Option<T>> {
        let key_bytes = self.full_key_bytes(key)?;
        // an empty value is still a live entry, so branch on presence
        let Some(value) = store.get(&key_bytes)? else {
            return Ok(None);
        };

        let (_, primary_key) = self.decode_entry(&key_bytes, &value)?;
        match self.primary.get(store, &primary_key)? {
            Some(record) => Ok(Some(record)),
            None => Err(CoreError::index_desync(format!(
                "unique index {} entry references a primary key missing from table {}",
                self.name,
                T::schema().name
            ))),
        }
    }

    /// Writes this index's entry for a newly created record.
    ///
    /// Fails with a uniqueness violation - and performs no write - if
    /// another record already owns the key.
    pub(crate) fn on_create(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        let key_values = extract_values(record, &self.key_field_names)?;
        let key = self.full_key_bytes(&key_values)?;

        if store.has(&key)? {
            return Err(CoreError::unique_violation(&self.name));
        }

        let value = self.entry_value(record)?;
        store.set(&key, &value)?;
        Ok(())
    }

    /// Replays an update: no-op when the unique key is unchanged;
    /// otherwise the new key must be free, then the old entry is
    /// deleted and the new one written.
    pub(crate) fn on_update(&self, store: &mut dyn WriteStore, old: &T, new: &T) -> CoreResult<()> {
        let old_values = extract_values(old, &self.key_field_names)?;
        let new_values = extract_values(new, &self.key_field_names)?;
        if self.key_codec.compare(&new_values, &old_values) == Ordering::Equal {
            return Ok(());
        }

        let new_key = self.full_key_bytes(&new_values)?;
        if store.has(&new_key)? {
            return Err(CoreError::unique_violation(&self.name));
        }

        let old_key = self.full_key_bytes(&old_values)?;
        store.delete(&old_key)?;

        let value = self.entry_value(new)?;
        store.set(&new_key, &value)?;
        Ok(())
    }

    /// Removes this index's entry for a deleted record.
    pub(crate) fn on_delete(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        let key_values = extract_values(record, &self.key_field_names)?;
        let key = self.full_key_bytes(&key_values)?;
        store.delete(&key)?;
        Ok(())
    }

    /// Returns whether `record`'s unique key is already owned.
    ///
    /// Used by the table to check every unique constraint before any
    /// write of a mutation is issued.
    pub(crate) fn would_conflict(&self, store: &dyn ReadStore, record: &T) -> CoreResult<bool> {
        let key_values = extract_values(record, &self.key_field_names)?;
        self.has(store, &key_values)
    }

    /// Like [`would_conflict`](Self::would_conflict), but ignores an
    /// entry the old version of the record owns (unchanged keys are
    /// never conflicts on update).
    pub(crate) fn would_conflict_on_update(
        &self,
        store: &dyn ReadStore,
        old: &T,
        new: &T,
    ) -> CoreResult<bool> {
        let old_values = extract_values(old, &self.key_field_names)?;
        let new_values = extract_values(new, &self.key_field_names)?;
        if self.key_codec.compare(&new_values, &old_values) == Ordering::Equal {
            return Ok(false);
        }
        self.has(store, &new_values)
    }

    /// Iterates entries whose unique key starts with `key_prefix`.
    pub fn prefix_iterator<'a>(
        &'a self,
        store: &'a dyn ReadStore,
        key_prefix: &[FieldValue],
        options: &IteratorOptions,
    ) -> CoreResult<RecordIterator<'a, T>> {
        let prefix = self.prefix_bytes(key_prefix)?;
        RecordIterator::prefix(self, store, &prefix, options)
    }

    /// Iterates entries with unique keys in `[start, end]`; either
    /// bound may be empty.
    pub fn range_iterator<'a>(
        &'a self,
        store: &'a dyn ReadStore,
        start: &[FieldValue],
        end: &[FieldValue],
        options: &IteratorOptions,
    ) -> CoreResult<RecordIterator<'a, T>> {
        self.key_codec.check_valid_range_keys(start, end)?;
        let start_bytes = self.prefix_bytes(start)?;
        let end_bytes = self.prefix_bytes(end)?;
        RecordIterator::range(self, store, &start_bytes, &end_bytes, options)
    }

    /// Encodes the entry value: the primary key fields not already in
    /// the unique key.
    fn entry_value(&self, record: &T) -> CoreResult<Vec<u8>> {
        let values = extract_values(record, &self.value_field_names)?;
        Ok(self.value_codec.encode(&values)?)
    }

    fn full_key_bytes(&self, key: &[FieldValue]) -> CoreResult<Vec<u8>> {
        if key.len() != self.key_codec.arity() {
            return Err(CoreError::invalid_key(format!(
                "unique key for index {} needs {} fields, got {}",
                self.name,
                self.key_codec.arity(),
                key.len()
            )));
        }
        self.prefix_bytes(key)
    }

    fn prefix_bytes(&self, key: &[FieldValue]) -> CoreResult<Vec<u8>> {
        let mut bytes = self.prefix.clone();
        bytes.extend_from_slice(&self.key_codec.encode(key)?);
        Ok(bytes)
    }
}

impl<T: Record> EntryResolver<T> for UniqueIndex<T> {
    fn decode_entry(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> CoreResult<(Vec<FieldValue>, Vec<FieldValue>)> {
        let rest = key.strip_prefix(self.prefix.as_slice()).ok_or_else(|| {
            CoreError::index_desync(format!("entry key outside unique index {}", self.name))
        })?;
        let key_values = self.key_codec.decode(rest)?;
        let value_values = self.value_codec.decode(value)?;

        let primary_key = self
            .pk_slots
            .iter()
            .map(|slot| match *slot {
                PkSlot::Key(pos) => key_values[pos].clone(),
                PkSlot::Value(pos) => value_values[pos].clone(),
            })
            .collect();
        Ok((key_values, primary_key))
    }

    fn resolve_record(
        &self,
        store: &dyn ReadStore,
        primary_key: &[FieldValue],
        _entry_value: &[u8],
    ) -> CoreResult<T> {
        self.primary.get(store, primary_key)?.ok_or_else(|| {
            CoreError::index_desync(format!(
                "unique index {} entry references a primary key missing from table {}",
                self.name,
                T::schema().name
            ))
        })
    }
}
