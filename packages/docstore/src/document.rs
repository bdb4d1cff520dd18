//! Document representation shared by all store implementations.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::path::FieldPath;

/// A document: a string id plus a JSON object of fields.
///
/// Field values are arbitrary JSON; typed entities move in and out through
/// [`to_fields`] and [`Document::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Build a document from an id and a JSON object value.
    ///
    /// Fails with [`StoreError::NotAnObject`] for non-object values.
    pub fn new(id: impl Into<String>, fields: Value) -> Result<Self> {
        match fields {
            Value::Object(map) => Ok(Self {
                id: id.into(),
                fields: map,
            }),
            other => Err(StoreError::NotAnObject {
                got: json_type_name(&other),
            }),
        }
    }

    /// Look up a (possibly nested) field value.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let mut segments = path.segments().iter();
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Decode the fields into a typed entity.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

/// Encode an entity into the JSON object a store write expects.
///
/// Fails with [`StoreError::NotAnObject`] if the entity serializes to a
/// non-object (e.g. a bare string or number).
pub fn to_fields<T: Serialize>(entity: &T) -> Result<Value> {
    let value = serde_json::to_value(entity)?;
    if !value.is_object() {
        return Err(StoreError::NotAnObject {
            got: json_type_name(&value),
        });
    }
    Ok(value)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
