//! Grouped writes.
//!
//! A batch is best-effort: writes are applied in order and the batch stops
//! at the first failure. It is NOT a cross-collection transaction; callers
//! that need stronger guarantees must design for the partial-failure
//! window themselves.

use serde_json::Value;

use crate::path::FieldUpdate;

/// One write in a batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Overwrite the document (creating it if absent)
    Set {
        collection: String,
        id: String,
        fields: Value,
    },
    /// Deep-merge fields into the document (creating it if absent)
    Merge {
        collection: String,
        id: String,
        fields: Value,
    },
    /// Apply partial updates; fails if the document is absent
    Update {
        collection: String,
        id: String,
        updates: Vec<FieldUpdate>,
    },
    /// Delete the document, if present
    Delete { collection: String, id: String },
}

impl WriteOp {
    pub fn set(collection: impl Into<String>, id: impl Into<String>, fields: Value) -> Self {
        WriteOp::Set {
            collection: collection.into(),
            id: id.into(),
            fields,
        }
    }

    pub fn merge(collection: impl Into<String>, id: impl Into<String>, fields: Value) -> Self {
        WriteOp::Merge {
            collection: collection.into(),
            id: id.into(),
            fields,
        }
    }

    pub fn update(
        collection: impl Into<String>,
        id: impl Into<String>,
        updates: Vec<FieldUpdate>,
    ) -> Self {
        WriteOp::Update {
            collection: collection.into(),
            id: id.into(),
            updates,
        }
    }

    pub fn delete(collection: impl Into<String>, id: impl Into<String>) -> Self {
        WriteOp::Delete {
            collection: collection.into(),
            id: id.into(),
        }
    }
}
