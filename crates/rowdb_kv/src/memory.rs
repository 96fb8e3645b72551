//! In-memory ordered store for testing and ephemeral databases.

use crate::error::KvResult;
use crate::store::{KvIterator, ReadStore, WriteStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

/// An in-memory ordered key-value store.
///
/// Backed by a `BTreeMap`, so iteration order is lexicographic over
/// raw key bytes. Suitable for:
/// - Unit and integration tests
/// - Ephemeral tables that don't need persistence
///
/// # Iteration Semantics
///
/// Iterators snapshot their range at creation time. Writes performed
/// after an iterator is created are not visible to it, which mirrors
/// the snapshot isolation a transactional backend would provide.
///
/// # Example
///
/// ```rust
/// use rowdb_kv::{MemStore, ReadStore, WriteStore};
///
/// let mut store = MemStore::new();
/// store.set(b"k", b"v").unwrap();
/// assert!(store.has(b"k").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns a copy of all entries in key order.
    ///
    /// Useful for test assertions.
    #[must_use]
    pub fn dump(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn snapshot_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<(Vec<u8>, Vec<u8>)> {
        let lower = match start {
            Some(s) => Bound::Included(s.to_vec()),
            None => Bound::Unbounded,
        };
        let upper = match end {
            Some(e) => Bound::Excluded(e.to_vec()),
            None => Bound::Unbounded,
        };
        self.entries
            .read()
            .range((lower, upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl ReadStore for MemStore {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn has(&self, key: &[u8]) -> KvResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    fn iterator<'a>(
        &'a self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> KvResult<Box<dyn KvIterator + 'a>> {
        let entries = self.snapshot_range(start, end);
        Ok(Box::new(MemIterator { entries, pos: 0 }))
    }

    fn reverse_iterator<'a>(
        &'a self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> KvResult<Box<dyn KvIterator + 'a>> {
        let mut entries = self.snapshot_range(start, end);
        entries.reverse();
        Ok(Box::new(MemIterator { entries, pos: 0 }))
    }
}

impl WriteStore for MemStore {
    fn set(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Iterator over a snapshotted range of a [`MemStore`].
struct MemIterator {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: usize,
}

impl KvIterator for MemIterator {
    fn valid(&self) -> bool {
        self.pos < self.entries.len()
    }

    fn next(&mut self) {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
    }

    fn key(&self) -> &[u8] {
        &self.entries[self.pos].0
    }

    fn value(&self) -> &[u8] {
        &self.entries[self.pos].1
    }
}
