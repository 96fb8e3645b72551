//! Table orchestration: routing one record mutation to the primary
//! key index and every registered secondary/unique index.

use crate::error::{CoreError, CoreResult};
use crate::index::{PkSlot, PrimaryKeyIndex, SecondaryIndex, TableIndex, UniqueIndex};
use crate::record::{Record, Schema};
use rowdb_codec::{FieldValue, KeyCodec, KeyField};
use rowdb_kv::{ReadStore, WriteStore};
use std::marker::PhantomData;
use tracing::debug;

/// A table of records with a primary key index and zero or more
/// secondary indexes.
///
/// Every mutation fans out to all indexes through the same write
/// store, so an atomic batch commits or aborts them together; the
/// engine itself performs no locking and no transactions. Concurrent
/// writers to the same primary key must be serialized by the caller.
///
/// # Example
///
/// ```rust,ignore
/// let table: Table<User> = Table::builder(vec![1])
///     .index(&["name"])
///     .unique(&["email"])
///     .build()?;
///
/// table.create(&mut store, &user)?;
/// let found = table.get(&store, &[FieldValue::Uint64(1)])?;
/// ```
pub struct Table<T: Record> {
    primary: PrimaryKeyIndex<T>,
    indexes: Vec<TableIndex<T>>,
}

impl<T: Record> std::fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &T::schema().name)
            .field("indexes", &self.indexes.len())
            .finish_non_exhaustive()
    }
}

impl<T: Record> Table<T> {
    /// Starts building a table stored under `prefix`.
    ///
    /// Each index of the table lives under `prefix ‖ [id]`: the
    /// primary key index has id 0, registered indexes get 1, 2, … in
    /// registration order.
    #[must_use]
    pub fn builder(prefix: Vec<u8>) -> TableBuilder<T> {
        TableBuilder {
            prefix,
            indexes: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the primary key index.
    #[must_use]
    pub fn primary(&self) -> &PrimaryKeyIndex<T> {
        &self.primary
    }

    /// Returns the `n`-th registered secondary (non-unique) index.
    #[must_use]
    pub fn secondary(&self, n: usize) -> Option<&SecondaryIndex<T>> {
        self.indexes
            .iter()
            .filter_map(|index| match index {
                TableIndex::Secondary(s) => Some(s),
                TableIndex::Unique(_) => None,
            })
            .nth(n)
    }

    /// Returns the `n`-th registered unique index.
    #[must_use]
    pub fn unique(&self, n: usize) -> Option<&UniqueIndex<T>> {
        self.indexes
            .iter()
            .filter_map(|index| match index {
                TableIndex::Unique(u) => Some(u),
                TableIndex::Secondary(_) => None,
            })
            .nth(n)
    }

    /// Point lookup by primary key. Absent is `Ok(None)`.
    pub fn get(&self, store: &dyn ReadStore, key: &[FieldValue]) -> CoreResult<Option<T>> {
        self.primary.get(store, key)
    }

    /// Returns whether a record with this primary key exists.
    pub fn has(&self, store: &dyn ReadStore, key: &[FieldValue]) -> CoreResult<bool> {
        self.primary.has(store, key)
    }

    /// Creates a new record.
    ///
    /// Fails with [`AlreadyExists`](CoreError::AlreadyExists) when
    /// the primary key is taken. All unique constraints are checked
    /// before any write is issued, so a violation leaves the store
    /// untouched.
    pub fn create(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        let key = self.primary.key_from_record(record)?;
        if self.primary.has(store, &key)? {
            return Err(CoreError::AlreadyExists {
                table: T::schema().name.to_string(),
            });
        }

        for index in &self.indexes {
            if let TableIndex::Unique(unique) = index {
                if unique.would_conflict(store, record)? {
                    return Err(CoreError::unique_violation(unique.name()));
                }
            }
        }

        self.primary.set(store, record)?;
        for index in &self.indexes {
            index.on_create(store, record)?;
        }

        debug!(table = T::schema().name, key = ?key, "created record");
        Ok(())
    }

    /// Updates an existing record, replacing it wholesale.
    ///
    /// Fails with [`NotFound`](CoreError::NotFound) when the primary
    /// key does not exist. Unique constraints whose keys changed are
    /// checked before any write is issued.
    pub fn update(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        let key = self.primary.key_from_record(record)?;
        let old = self
            .primary
            .get(store, &key)?
            .ok_or_else(|| CoreError::NotFound {
                table: T::schema().name.to_string(),
            })?;

        for index in &self.indexes {
            if let TableIndex::Unique(unique) = index {
                if unique.would_conflict_on_update(store, &old, record)? {
                    return Err(CoreError::unique_violation(unique.name()));
                }
            }
        }

        self.primary.set(store, record)?;
        for index in &self.indexes {
            index.on_update(store, &old, record)?;
        }

        debug!(table = T::schema().name, key = ?key, "updated record");
        Ok(())
    }

    /// Creates the record if its primary key is free, updates it
    /// otherwise.
    pub fn save(&self, store: &mut dyn WriteStore, record: &T) -> CoreResult<()> {
        let key = self.primary.key_from_record(record)?;
        if self.primary.has(store, &key)? {
            self.update(store, record)
        } else {
            self.create(store, record)
        }
    }

    /// Deletes the record at `key`, removing every index entry
    /// derived from it. Returns whether a record was deleted.
    pub fn delete(&self, store: &mut dyn WriteStore, key: &[FieldValue]) -> CoreResult<bool> {
        let Some(old) = self.primary.get(store, key)? else {
            return Ok(false);
        };

        self.primary.remove(store, key)?;
        for index in &self.indexes {
            index.on_delete(store, &old)?;
        }

        debug!(table = T::schema().name, key = ?key, "deleted record");
        Ok(true)
    }
}

/// Builder for [`Table`].
pub struct TableBuilder<T: Record> {
    prefix: Vec<u8>,
    /// Field lists with a uniqueness flag, in registration order.
    indexes: Vec<(Vec<String>, bool)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> TableBuilder<T> {
    /// Registers a secondary (non-unique) index over `fields`.
    #[must_use]
    pub fn index(mut self, fields: &[&str]) -> Self {
        self.indexes
            .push((fields.iter().map(ToString::to_string).collect(), false));
        self
    }

    /// Registers a unique index over `fields`.
    #[must_use]
    pub fn unique(mut self, fields: &[&str]) -> Self {
        self.indexes
            .push((fields.iter().map(ToString::to_string).collect(), true));
        self
    }

    /// Validates the definitions against the record schema and builds
    /// the table.
    pub fn build(self) -> CoreResult<Table<T>> {
        let schema = T::schema();

        if schema.primary_key.is_empty() {
            return Err(CoreError::invalid_schema(format!(
                "table {} declares no primary key",
                schema.name
            )));
        }
        let pk_names: Vec<String> = schema.primary_key.iter().map(ToString::to_string).collect();
        let primary_codec = codec_for(schema, &pk_names)?;

        let mut primary_prefix = self.prefix.clone();
        primary_prefix.push(0);
        let primary = PrimaryKeyIndex::new(primary_prefix, primary_codec, pk_names.clone());

        let mut indexes = Vec::with_capacity(self.indexes.len());
        for (n, (fields, is_unique)) in self.indexes.iter().enumerate() {
            let id = u8::try_from(n + 1).map_err(|_| {
                CoreError::invalid_schema(format!(
                    "table {} has more than 255 indexes",
                    schema.name
                ))
            })?;
            validate_index_fields(schema, fields)?;

            let name = fields.join(",");
            let mut prefix = self.prefix.clone();
            prefix.push(id);

            let index = if *is_unique {
                let key_codec = codec_for(schema, fields)?;
                let value_names: Vec<String> = pk_names
                    .iter()
                    .filter(|pk| !fields.contains(pk))
                    .cloned()
                    .collect();
                let value_codec = codec_for(schema, &value_names)?;

                let pk_slots = pk_names
                    .iter()
                    .map(|pk| match fields.iter().position(|f| f == pk) {
                        Some(pos) => PkSlot::Key(pos),
                        None => PkSlot::Value(
                            value_names
                                .iter()
                                .position(|v| v == pk)
                                .expect("pk field is in key or value"),
                        ),
                    })
                    .collect();

                TableIndex::Unique(UniqueIndex::new(
                    name,
                    prefix,
                    key_codec,
                    value_codec,
                    fields.clone(),
                    value_names,
                    pk_slots,
                    primary.clone(),
                ))
            } else {
                let mut combined = fields.clone();
                for pk in &pk_names {
                    if !combined.contains(pk) {
                        combined.push(pk.clone());
                    }
                }
                let pk_positions = pk_names
                    .iter()
                    .map(|pk| {
                        combined
                            .iter()
                            .position(|f| f == pk)
                            .expect("pk field was appended")
                    })
                    .collect();
                let codec = codec_for(schema, &combined)?;

                TableIndex::Secondary(SecondaryIndex::new(
                    name,
                    prefix,
                    codec,
                    fields.len(),
                    combined,
                    pk_positions,
                    primary.clone(),
                ))
            };
            indexes.push(index);
        }

        Ok(Table { primary, indexes })
    }
}

/// Builds a key codec over the named schema fields.
fn codec_for(schema: &Schema, names: &[String]) -> CoreResult<KeyCodec> {
    let fields = names
        .iter()
        .map(|name| {
            let descriptor = schema.field(name).ok_or_else(|| {
                CoreError::invalid_schema(format!(
                    "table {} has no field named {name}",
                    schema.name
                ))
            })?;
            Ok(KeyField::new(descriptor.name, descriptor.kind))
        })
        .collect::<CoreResult<Vec<_>>>()?;
    Ok(KeyCodec::new(fields))
}

/// Rejects empty and duplicated index field lists.
fn validate_index_fields(schema: &Schema, fields: &[String]) -> CoreResult<()> {
    if fields.is_empty() {
        return Err(CoreError::invalid_schema(format!(
            "table {} has an index with no fields",
            schema.name
        )));
    }
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].contains(field) {
            return Err(CoreError::invalid_schema(format!(
                "index field {field} repeated in table {}",
                schema.name
            )));
        }
    }
    Ok(())
}
