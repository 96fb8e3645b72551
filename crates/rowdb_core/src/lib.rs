//! Table and index layer over an ordered key/value store.
//!
//! Records implement [`Record`], declaring a static [`Schema`] and a
//! wire codec for their payload. A [`Table`] stores them under an
//! order-preserving primary key encoding and maintains any number of
//! secondary and unique indexes, all living in one [`ReadStore`] /
//! [`WriteStore`] keyspace (see the `rowdb_kv` crate). Index scans
//! come back as [`RecordIterator`]s supporting prefix and range
//! bounds, both directions, and cursor resumption.
//!
//! ```rust,ignore
//! let table: Table<User> = Table::builder(vec![1])
//!     .index(&["name"])
//!     .unique(&["email"])
//!     .build()?;
//!
//! table.create(&mut store, &user)?;
//! let mut it = table
//!     .secondary(0)
//!     .unwrap()
//!     .prefix_iterator(&store, &[FieldValue::from("bob")], IteratorOptions::default())?;
//! while it.next()? {
//!     let user = it.record();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod index;
mod iter;
mod record;
mod table;

#[cfg(test)]
mod testutil;

pub use error::{CoreError, CoreResult};
pub use index::{PrimaryKeyIndex, SecondaryIndex, UniqueIndex};
pub use iter::{Cursor, IteratorOptions, RecordIterator};
pub use record::{FieldDescriptor, Record, Schema};
pub use table::{Table, TableBuilder};

pub use rowdb_codec::{FieldKind, FieldValue};
pub use rowdb_kv::{ReadStore, WriteStore};
