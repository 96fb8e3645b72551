//! Primary key index: the canonical record store.

use crate::error::{CoreError, CoreResult};
use crate::iter::{EntryResolver, IteratorOptions, RecordIterator};
use crate::record::{extract_values, Record};
use rowdb_codec::{FieldValue, KeyCodec};
use rowdb_kv::{ReadStore, WriteStore};
use std::marker::PhantomData;

/// The canonical store for a table's records.
///
/// Maps `prefix ‖ encode(primary_key)` to the full encoded record.
/// Every other index resolves through this one; an entry elsewhere
/// whose primary key does not resolve here is an
/// [`IndexDesync`](CoreError::IndexDesync), never a silent empty
/// result.
#[derive(Clone)]
pub struct PrimaryKeyIndex<T: Record> {
    prefix: Vec<u8>,
    codec: KeyCodec,
    field_names: Vec<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> PrimaryKeyIndex<T> {
    pub(crate) fn new(prefix: Vec<u8>, codec: KeyCodec, field_names: Vec<String>) -> Self {
        Self {
            prefix,
            codec,
            field_names,
            _marker: PhantomData,
        }
    }

    /// Returns the key codec for the primary key shape.
    #[must_use]
    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    /// Point lookup by exact primary key.
    ///
    /// Returns `Ok(None)` when absent; absence is a normal outcome
    /// here, unlike when dereferencing an index entry.
    pub fn get(&self, store: &dyn ReadStore, key: &[FieldValue]) -> CoreResult<Option<T>> {
        let key_bytes = self.full_key_bytes(key)?;
        match store.get(&key_bytes)? {
            Some(bytes) => Ok(Some(T::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns whether a record with this primary key exists.
    pub fn has(&self, store: &dyn ReadStore, key: &[FieldValue]) -> CoreResult<bool> {
        let key_bytes = self.full_key_bytes(key)?;
        Ok(store.has(&key_bytes)?)
    }

    /// Writes the canonical entry for `record`.
    pub(crate) fn set(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        let key = self.key_from_record(record)?;
        let key_bytes = self.full_key_bytes(&key)?;
        let value = record.encode()?;
        store.set(&key_bytes, &value)?;
        Ok(())
    }

    /// Removes the canonical entry at `key`.
    pub(crate) fn remove(&self, store: &mut dyn WriteStore, key: &[FieldValue]) -> CoreResult<()> {
        let key_bytes = self.full_key_bytes(key)?;
        store.delete(&key_bytes)?;
        Ok(())
    }

    /// Extracts the primary key values from a record.
    pub(crate) fn key_from_record(&self, record: &T) -> CoreResult<Vec<FieldValue>> {
        extract_values(record, &self.field_names)
    }

    /// Iterates records whose primary key starts with `key_prefix`
    /// (empty prefix scans the whole table).
    pub fn prefix_iterator<'a>(
        &'a self,
        store: &'a dyn ReadStore,
        key_prefix: &[FieldValue],
        options: &IteratorOptions,
    ) -> CoreResult<RecordIterator<'a, T>> {
        let prefix = self.prefix_bytes(key_prefix)?;
        RecordIterator::prefix(self, store, &prefix, options)
    }

    /// Iterates records with primary keys in `[start, end]`; either
    /// bound may be empty (unbounded on that side).
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

    /// Encodes a full primary key with the index prefix.
    fn full_key_bytes(&self, key: &[FieldValue]) -> CoreResult<Vec<u8>> {
        if key.len() != self.codec.arity() {
            return Err(CoreError::invalid_key(format!(
                "primary key needs {} fields, got {}",
                self.codec.arity(),
                key.len()
            )));
        }
        self.prefix_bytes(key)
    }

    /// Encodes a full or partial primary key with the index prefix.
    fn prefix_bytes(&self, key: &[FieldValue]) -> CoreResult<Vec<u8>> {
        let mut bytes = self.prefix.clone();
        bytes.extend_from_slice(&self.codec.encode(key)?);
        Ok(bytes)
    }

    /// Strips the index prefix off a raw entry key.
    fn strip_prefix<'k>(&self, key: &'k [u8]) -> CoreResult<&'k [u8]> {
        key.strip_prefix(self.prefix.as_slice()).ok_or_else(|| {
            CoreError::index_desync(format!(
                "entry key outside primary index prefix of table {}",
                T::schema().name
            ))
        })
    }
}

impl<T: Record> EntryResolver<T> for PrimaryKeyIndex<T> {
    fn decode_entry(
        &self,
        key: &[u8],
        _value: &[u8],
    ) -> CoreResult<(Vec<FieldValue>, Vec<FieldValue>)> {
        let key_values = self.codec.decode(self.strip_prefix(key)?)?;
        // for the primary index the index key IS the primary key
        Ok((key_values.clone(), key_values))
    }

    fn resolve_record(
        &self,
        _store: &dyn ReadStore,
        _primary_key: &[FieldValue],
        entry_value: &[u8],
    ) -> CoreResult<T> {
        // the entry's own value holds the record; no dereference step
        T::decode(entry_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{pk, user, User};
    use rowdb_codec::{FieldKind, KeyField};
    use rowdb_kv::MemStore;

    fn index() -> PrimaryKeyIndex<User> {
        PrimaryKeyIndex::new(
            vec![1, 0],
            KeyCodec::new(vec![KeyField::new("id", FieldKind::Uint64)]),
            vec!["id".to_string()],
        )
    }

    #[test]
    fn set_get_round_trip() {
        let idx = index();
        let mut store = MemStore::new();
        let u = user(1, "alice", "a@x");

        idx.set(&mut store, &u).unwrap();
        assert_eq!(idx.get(&store, &pk(1)).unwrap(), Some(u));
    }

    #[test]
    fn get_absent_is_none_not_error() {
        let idx = index();
        let store = MemStore::new();
        assert_eq!(idx.get(&store, &pk(42)).unwrap(), None);
    }

    #[test]
    fn get_with_wrong_arity_fails() {
        let idx = index();
        let store = MemStore::new();
        let err = idx.get(&store, &[]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey { .. }));
    }

    #[test]
    fn remove_deletes_entry() {
        let idx = index();
        let mut store = MemStore::new();
        idx.set(&mut store, &user(1, "a", "a@x")).unwrap();

        idx.remove(&mut store, &pk(1)).unwrap();
        assert!(!idx.has(&store, &pk(1)).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn prefix_iterator_yields_in_key_order() {
        let idx = index();
        let mut store = MemStore::new();
        for id in [3u64, 1, 2] {
            idx.set(&mut store, &user(id, "u", "u@x")).unwrap();
        }

        let mut it = idx
            .prefix_iterator(&store, &[], &IteratorOptions::default())
            .unwrap();
        let mut ids = Vec::new();
        while it.next().unwrap() {
            ids.push(it.primary_key()[0].as_u64().unwrap());
            // primary iterators decode the record from the entry itself
            assert_eq!(it.record().unwrap().id, *ids.last().unwrap());
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn range_iterator_is_end_inclusive() {
        let idx = index();
        let mut store = MemStore::new();
        for id in 1u64..=5 {
            idx.set(&mut store, &user(id, "u", "u@x")).unwrap();
        }

        let mut it = idx
            .range_iterator(&store, &pk(2), &pk(4), &IteratorOptions::default())
            .unwrap();
        let mut ids = Vec::new();
        while it.next().unwrap() {
            ids.push(it.primary_key()[0].as_u64().unwrap());
        }
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn inverted_range_fails_before_store_access() {
        let idx = index();
        let store = MemStore::new();
        let err = idx
            .range_iterator(&store, &pk(4), &pk(2), &IteratorOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Codec(rowdb_codec::CodecError::InvalidRange { .. })
        ));
    }
}
