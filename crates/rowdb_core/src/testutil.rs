//! Shared test fixtures.

use crate::error::{CoreError, CoreResult};
use crate::record::{FieldDescriptor, Record, Schema};
use rowdb_codec::{FieldKind, FieldValue};
use serde::{Deserialize, Serialize};

/// Test record: a user keyed by `id`, with a non-unique `name` and a
/// unique `email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

static USER_SCHEMA: Schema = Schema {
    name: "User",
    fields: &[
        FieldDescriptor {
            name: "id",
            kind: FieldKind::Uint64,
        },
        FieldDescriptor {
            name: "name",
            kind: FieldKind::Str,
        },
        FieldDescriptor {
            name: "email",
            kind: FieldKind::Str,
        },
    ],
    primary_key: &["id"],
};

impl Record for User {
    fn schema() -> &'static Schema {
        &USER_SCHEMA
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Uint64(self.id)),
            "name" => Some(FieldValue::from(self.name.as_str())),
            "email" => Some(FieldValue::from(self.email.as_str())),
            _ => None,
        }
    }

    fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::invalid_record(e.to_string()))?;
        Ok(buf)
    }

    fn decode(bytes: &[u8]) -> CoreResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::invalid_record(e.to_string()))
    }
}

/// Shorthand constructor.
pub fn user(id: u64, name: &str, email: &str) -> User {
    User {
        id,
        name: name.to_string(),
        email: email.to_string(),
    }
}

/// Primary key values for a user id.
pub fn pk(id: u64) -> Vec<FieldValue> {
    vec![FieldValue::Uint64(id)]
}
