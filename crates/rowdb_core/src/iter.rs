//! Shared iteration and cursor machinery for all index kinds.
//!
//! Every index exposes prefix and range scans through one engine.
//! Construction turns the logical bounds into raw byte bounds via the
//! owning index's codec, then walks the store with a forward or
//! reverse raw iterator. Entries decode eagerly on each step so the
//! accessors are valid until the next step; full records materialize
//! lazily, only when asked for.

use crate::error::CoreResult;
use crate::record::Record;
use rowdb_codec::{prefix_end, FieldValue};
use rowdb_kv::{KvIterator, ReadStore};

/// A resume point for iteration: the raw store key of the
/// last-yielded entry.
///
/// Cursors are opaque to callers; persist the bytes and hand them
/// back via [`IteratorOptions::cursor`] to resume strictly after the
/// captured position, with no entry repeated and none skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(Vec<u8>);

impl Cursor {
    /// Wraps raw cursor bytes previously obtained from
    /// [`RecordIterator::cursor`].
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the raw cursor bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the cursor, returning the raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// The smallest key strictly after the cursor position.
    fn successor(&self) -> Vec<u8> {
        let mut start = self.0.clone();
        start.push(0);
        start
    }
}

/// Options recognized on an iteration request.
#[derive(Debug, Clone, Default)]
pub struct IteratorOptions {
    /// Traverse in descending key order (default ascending).
    pub reverse: bool,
    /// Resume point; see [`Cursor`].
    pub cursor: Option<Cursor>,
}

impl IteratorOptions {
    /// Options for a reverse traversal.
    #[must_use]
    pub fn reverse() -> Self {
        Self {
            reverse: true,
            cursor: None,
        }
    }

    /// Options resuming after `cursor`.
    #[must_use]
    pub fn resume(cursor: Cursor) -> Self {
        Self {
            reverse: false,
            cursor: Some(cursor),
        }
    }

    /// Options resuming a reverse traversal after `cursor`.
    #[must_use]
    pub fn resume_reverse(cursor: Cursor) -> Self {
        Self {
            reverse: true,
            cursor: Some(cursor),
        }
    }
}

/// How an index kind decodes its raw entries and materializes full
/// records. Implemented by the primary, secondary, and unique
/// indexes; the iterator engine is generic over it.
pub(crate) trait EntryResolver<T: Record> {
    /// Decodes a raw store entry into index-key values and
    /// primary-key values.
    fn decode_entry(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> CoreResult<(Vec<FieldValue>, Vec<FieldValue>)>;

    /// Materializes the full record for a decoded entry.
    ///
    /// Non-primary indexes dereference the primary key index here; a
    /// miss at that point is an internal consistency error, never a
    /// normal not-found.
    fn resolve_record(
        &self,
        store: &dyn ReadStore,
        primary_key: &[FieldValue],
        entry_value: &[u8],
    ) -> CoreResult<T>;
}

/// An ordered, cursor-resumable iterator over one index.
///
/// The iterator starts positioned *before* the first qualifying
/// entry; the first [`next`](Self::next) call lands on it. Dropping
/// the iterator releases the underlying store handle on every exit
/// path, including early `break`. The borrow on the store keeps the
/// iterator from outliving the store or batch it was opened against.
pub struct RecordIterator<'a, T: Record> {
    resolver: &'a dyn EntryResolver<T>,
    store: &'a dyn ReadStore,
    iter: Box<dyn KvIterator + 'a>,
    started: bool,
    index_values: Vec<FieldValue>,
    primary_key: Vec<FieldValue>,
    entry_key: Vec<u8>,
    entry_value: Vec<u8>,
}

impl<T: Record> std::fmt::Debug for RecordIterator<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordIterator")
            .field("started", &self.started)
            .field("entry_key", &self.entry_key)
            .finish_non_exhaustive()
    }
}

impl<'a, T: Record> RecordIterator<'a, T> {
    /// Opens a prefix scan over `[prefix, prefix_end(prefix))`.
    ///
    /// With a cursor the scan starts at `cursor ‖ 0x00` (forward) or
    /// ends exclusively at the cursor (reverse), resuming strictly
    /// after the captured position either way.
    pub(crate) fn prefix(
        resolver: &'a dyn EntryResolver<T>,
        store: &'a dyn ReadStore,
        prefix: &[u8],
        options: &IteratorOptions,
    ) -> CoreResult<Self> {
        let iter = if options.reverse {
            let end = match &options.cursor {
                Some(cursor) => Some(cursor.as_bytes().to_vec()),
                None => prefix_end(prefix),
            };
            store.reverse_iterator(Some(prefix), end.as_deref())?
        } else {
            let start = match &options.cursor {
                Some(cursor) => cursor.successor(),
                None => prefix.to_vec(),
            };
            let end = prefix_end(prefix);
            store.iterator(Some(&start), end.as_deref())?
        };

        Ok(Self::new(resolver, store, iter))
    }

    /// Opens a range scan over `[start, end]`, end inclusive.
    ///
    /// `end` is a (possibly partial) key prefix, so the exclusive
    /// upper bound is `prefix_end(end)`: everything extending the end
    /// prefix is still inside the range. Bounds must already carry
    /// the index's byte prefix and be validated.
    pub(crate) fn range(
        resolver: &'a dyn EntryResolver<T>,
        store: &'a dyn ReadStore,
        start: &[u8],
        end: &[u8],
        options: &IteratorOptions,
    ) -> CoreResult<Self> {
        let iter = if options.reverse {
            let upper = match &options.cursor {
                Some(cursor) => Some(cursor.as_bytes().to_vec()),
                None => prefix_end(end),
            };
            store.reverse_iterator(Some(start), upper.as_deref())?
        } else {
            let lower = match &options.cursor {
                Some(cursor) => cursor.successor(),
                None => start.to_vec(),
            };
            store.iterator(Some(&lower), prefix_end(end).as_deref())?
        };

        Ok(Self::new(resolver, store, iter))
    }

    fn new(
        resolver: &'a dyn EntryResolver<T>,
        store: &'a dyn ReadStore,
        iter: Box<dyn KvIterator + 'a>,
    ) -> Self {
        Self {
            resolver,
            store,
            iter,
            started: false,
            index_values: Vec::new(),
            primary_key: Vec::new(),
            entry_key: Vec::new(),
            entry_value: Vec::new(),
        }
    }

    /// Advances to the next entry.
    ///
    /// The first call lands on the first qualifying entry without
    /// advancing past it. Returns `Ok(false)` on exhaustion. Each
    /// successful step eagerly decodes the entry, so
    /// [`index_key`](Self::index_key) and
    /// [`primary_key`](Self::primary_key) are valid until the next
    /// call.
    pub fn next(&mut self) -> CoreResult<bool> {
        if self.started {
            self.iter.next();
        } else {
            self.started = true;
        }

        if !self.iter.valid() {
            return Ok(false);
        }

        self.entry_key = self.iter.key().to_vec();
        self.entry_value = self.iter.value().to_vec();
        let (index_values, primary_key) = self
            .resolver
            .decode_entry(&self.entry_key, &self.entry_value)?;
        self.index_values = index_values;
        self.primary_key = primary_key;

        Ok(true)
    }

    /// Returns the current entry's index key values.
    #[must_use]
    pub fn index_key(&self) -> &[FieldValue] {
        &self.index_values
    }

    /// Returns the current entry's primary key values.
    #[must_use]
    pub fn primary_key(&self) -> &[FieldValue] {
        &self.primary_key
    }

    /// Returns the current entry's raw store key, verbatim, for
    /// resuming later.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::from_bytes(self.entry_key.clone())
    }

    /// Materializes the full record for the current entry.
    pub fn record(&self) -> CoreResult<T> {
        self.resolver
            .resolve_record(self.store, &self.primary_key, &self.entry_value)
    }
}
