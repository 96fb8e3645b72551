//! Index kinds and mutation fan-out dispatch.

mod primary;
mod secondary;
mod unique;

pub use primary::PrimaryKeyIndex;
pub use secondary::SecondaryIndex;
pub use unique::UniqueIndex;

pub(crate) use unique::PkSlot;

use crate::error::CoreResult;
use crate::record::Record;
use rowdb_kv::WriteStore;

/// A registered non-primary index of a table.
///
/// The set of index kinds is closed; mutation fan-out dispatches by
/// matching on the variant.
pub(crate) enum TableIndex<T: Record> {
    /// Non-unique secondary index.
    Secondary(SecondaryIndex<T>),
    /// Unique secondary index.
    Unique(UniqueIndex<T>),
}

impl<T: Record> TableIndex<T> {
    pub(crate) fn on_create(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        match self {
            TableIndex::Secondary(index) => index.on_create(store, record),
            TableIndex::Unique(index) => index.on_create(store, record),
        }
    }

    pub(crate) fn on_update(&self, store: &mut dyn WriteStore, old: &T, new: &T) -> CoreResult<()> {
        match self {
            TableIndex::Secondary(index) => index.on_update(store, old, new),
            TableIndex::Unique(index) => index.on_update(store, old, new),
        }
    }

    pub(crate) fn on_delete(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        match self {
            TableIndex::Secondary(index) => index.on_delete(store, record),
            TableIndex::Unique(index) => index.on_delete(store, record),
        }
    }
}
