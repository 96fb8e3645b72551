//! Record trait and schema descriptors.

use crate::error::{CoreError, CoreResult};
use rowdb_codec::{FieldKind, FieldValue};

/// Describes one named, typed field of a record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: &'static str,
    /// Field kind.
    pub kind: FieldKind,
}

/// Static description of a record type: its name, ordered field list,
/// and the field names forming the primary key.
///
/// Schemas are declared as `&'static` constants by record types; the
/// table builder validates every index definition against them.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Record type name, used in error messages.
    pub name: &'static str,
    /// Ordered list of fields.
    pub fields: &'static [FieldDescriptor],
    /// Names of the fields forming the primary key, in key order.
    pub primary_key: &'static [&'static str],
}

impl Schema {
    /// Looks up a field descriptor by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A schema-defined structured record.
///
/// Records are immutable once read and replaced wholesale on update.
/// The trait plays the role reflection plays elsewhere: a fixed
/// schema descriptor plus a typed accessor (`field`) the engine uses
/// to pull key values out of a record, and a wire codec
/// (`encode`/`decode`) for the full payload stored under the primary
/// key. The wire format is the implementer's choice; the engine never
/// inspects it.
pub trait Record: Clone + Send + Sync + 'static {
    /// Returns the schema describing this record type.
    fn schema() -> &'static Schema;

    /// Reads a named field's typed value.
    ///
    /// Must return `Some` for every field the schema declares.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Serializes the full record to bytes.
    fn encode(&self) -> CoreResult<Vec<u8>>;

    /// Deserializes a record from bytes.
    fn decode(bytes: &[u8]) -> CoreResult<Self>;
}

/// Extracts the named fields from a record, in order.
pub(crate) fn extract_values<T: Record>(record: &T, names: &[String]) -> CoreResult<Vec<FieldValue>> {
    names
        .iter()
        .map(|name| {
            record.field(name).ok_or_else(|| {
                CoreError::invalid_schema(format!(
                    "record {} does not expose field {name}",
                    T::schema().name
                ))
            })
        })
        .collect()
}
