//! # RowDB KV
//!
//! Ordered key-value store traits and an in-memory implementation.
//!
//! This crate defines the lowest-level boundary of RowDB. Stores are
//! **sorted byte-string maps** - they hold no knowledge of tables,
//! indexes, or key encodings. The table engine issues all reads and
//! writes through these traits, so any backend exposing ordered
//! get/set/delete/iterate semantics can sit underneath it.
//!
//! ## Design Principles
//!
//! - Keys and values are opaque byte slices
//! - Iteration is over half-open `[start, end)` byte ranges, forward
//!   or reverse
//! - Iterators are scoped resources released on drop
//! - Durability, snapshotting, and batching belong to the backend
//!
//! ## Example
//!
//! ```rust
//! use rowdb_kv::{MemStore, ReadStore, WriteStore};
//!
//! let mut store = MemStore::new();
//! store.set(b"a", b"1").unwrap();
//! assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod store;

pub use error::{KvError, KvResult};
pub use memory::MemStore;
pub use store::{KvIterator, ReadStore, WriteStore};
