//! Store trait definitions.

use crate::error::KvResult;

/// Read access to an ordered key-value store.
///
/// Stores are **sorted byte maps**. Iteration order is lexicographic
/// over the raw key bytes; the table engine relies on this when it
/// turns prefix and range scans into byte bounds.
///
/// # Invariants
///
/// - `get` returns exactly the bytes previously written at that key
/// - `iterator` yields entries in ascending key order over
///   `[start, end)`; `reverse_iterator` yields the same entries in
///   descending order
/// - A `None` bound means unbounded on that side
pub trait ReadStore: Send + Sync {
    /// Returns the value stored at `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>>;

    /// Returns whether `key` is present.
    fn has(&self, key: &[u8]) -> KvResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Returns an ascending iterator over `[start, end)`.
    fn iterator<'a>(
        &'a self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> KvResult<Box<dyn KvIterator + 'a>>;

    /// Returns a descending iterator over `[start, end)`.
    fn reverse_iterator<'a>(
        &'a self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> KvResult<Box<dyn KvIterator + 'a>>;
}

/// Write access to an ordered key-value store.
///
/// Writes issued through one `WriteStore` handle are expected to
/// commit or abort together when the handle represents a batch;
/// atomicity across handles is the caller's responsibility.
pub trait WriteStore: ReadStore {
    /// Sets `key` to `value`, overwriting any existing entry.
    fn set(&mut self, key: &[u8], value: &[u8]) -> KvResult<()>;

    /// Deletes `key`. Deleting an absent key succeeds.
    fn delete(&mut self, key: &[u8]) -> KvResult<()>;
}

/// A raw cursor over store entries.
///
/// The iterator starts positioned on the first entry of its range (if
/// any). `key`/`value` must only be called while `valid` returns
/// true. Dropping the iterator releases any resources the backend
/// pinned for it (e.g., a snapshot); an iterator must not outlive the
/// store it was opened against, which the borrow checker enforces.
pub trait KvIterator {
    /// Returns whether the iterator is positioned on an entry.
    fn valid(&self) -> bool;

    /// Advances to the next entry in iteration order.
    fn next(&mut self);

    /// Returns the current entry's key.
    ///
    /// # Panics
    ///
    /// May panic if the iterator is not valid.
    fn key(&self) -> &[u8];

    /// Returns the current entry's value.
    ///
    /// # Panics
    ///
    /// May panic if the iterator is not valid.
    fn value(&self) -> &[u8];
}
