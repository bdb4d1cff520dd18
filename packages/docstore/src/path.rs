//! Typed nested-field update descriptors.
//!
//! Partial updates name their target as a validated path of object keys
//! rather than a dynamically assembled `"map.key"` string, so malformed
//! targets are rejected before they reach the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};

/// A validated path of object keys, root first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Build a path from explicit segments.
    ///
    /// Segments may contain any character (user ids are valid map keys);
    /// only empty paths and empty segments are rejected.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StoreError::InvalidPath {
                reason: "path has no segments".into(),
            });
        }
        if segments.iter().any(String::is_empty) {
            return Err(StoreError::InvalidPath {
                reason: "path contains an empty segment".into(),
            });
        }
        Ok(Self(segments))
    }

    /// Parse a dot-separated literal such as `"profile.name"`.
    ///
    /// Only suitable for static field names; keys that may themselves
    /// contain dots must go through [`FieldPath::from_segments`].
    pub fn parse(path: &str) -> Result<Self> {
        Self::from_segments(path.split('.'))
    }

    /// A single-segment path.
    pub fn root(name: impl Into<String>) -> Result<Self> {
        Self::from_segments([name.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// What an update does at its target path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateOp {
    /// Replace (or create) the value at the path
    Set(Value),
    /// Remove the field at the path, if present
    Delete,
}

/// One partial-update instruction: a path plus the operation to apply there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub path: FieldPath,
    pub op: UpdateOp,
}

impl FieldUpdate {
    pub fn set(path: FieldPath, value: impl Into<Value>) -> Self {
        Self {
            path,
            op: UpdateOp::Set(value.into()),
        }
    }

    pub fn delete(path: FieldPath) -> Self {
        Self {
            path,
            op: UpdateOp::Delete,
        }
    }
}

/// Apply updates to a fields object in place.
///
/// Intermediate objects are created as needed for `Set`; a path that
/// traverses a non-object value fails with [`StoreError::InvalidPath`].
/// `Delete` on an absent field is a no-op.
pub fn apply_updates(
    fields: &mut serde_json::Map<String, Value>,
    updates: &[FieldUpdate],
) -> Result<()> {
    for update in updates {
        apply_one(fields, update)?;
    }
    Ok(())
}

fn apply_one(fields: &mut serde_json::Map<String, Value>, update: &FieldUpdate) -> Result<()> {
    let segments = update.path.segments();
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(StoreError::InvalidPath {
            reason: "path has no segments".into(),
        });
    };

    let mut current = fields;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        current = entry.as_object_mut().ok_or_else(|| StoreError::InvalidPath {
            reason: format!("segment '{segment}' of '{}' is not an object", update.path),
        })?;
    }

    match &update.op {
        UpdateOp::Set(value) => {
            current.insert(leaf.clone(), value.clone());
        }
        UpdateOp::Delete => {
            current.remove(leaf);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn rejects_empty_paths() {
        assert!(FieldPath::from_segments(Vec::<String>::new()).is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse("name").is_ok());
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut fields = obj(json!({}));
        let update = FieldUpdate::set(FieldPath::parse("nicknames.u1").unwrap(), json!("Ada"));
        apply_updates(&mut fields, &[update]).unwrap();
        assert_eq!(fields["nicknames"]["u1"], json!("Ada"));
    }

    #[test]
    fn set_through_scalar_fails() {
        let mut fields = obj(json!({"name": "flat"}));
        let update = FieldUpdate::set(FieldPath::parse("name.nested").unwrap(), json!(1));
        let err = apply_updates(&mut fields, &[update]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
    }

    #[test]
    fn delete_removes_field_and_tolerates_absence() {
        let mut fields = obj(json!({"friends": {"u1": {"nickname": "A"}, "u2": {}}}));
        let del = FieldUpdate::delete(FieldPath::from_segments(["friends", "u1"]).unwrap());
        apply_updates(&mut fields, &[del]).unwrap();
        assert_eq!(fields["friends"], json!({"u2": {}}));

        // Deleting again is a no-op
        let del = FieldUpdate::delete(FieldPath::from_segments(["friends", "u1"]).unwrap());
        apply_updates(&mut fields, &[del]).unwrap();
    }
}
