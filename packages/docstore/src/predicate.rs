//! Query predicate language.
//!
//! Deliberately small: field equality, membership in a small id set, and
//! array containment, plus conjunction. Store implementations may push
//! these down to the backend; the in-memory store evaluates them directly.

use serde_json::Value;

use crate::document::Document;
use crate::path::FieldPath;

/// A query predicate over document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field value equals the given value
    FieldEq { path: FieldPath, value: Value },
    /// Field value is one of the given values (small sets only)
    FieldIn { path: FieldPath, values: Vec<Value> },
    /// Field is an array containing the given value
    ArrayContains { path: FieldPath, value: Value },
    /// All sub-predicates hold
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn field_eq(path: FieldPath, value: impl Into<Value>) -> Self {
        Predicate::FieldEq {
            path,
            value: value.into(),
        }
    }

    pub fn field_in(path: FieldPath, values: impl IntoIterator<Item = Value>) -> Self {
        Predicate::FieldIn {
            path,
            values: values.into_iter().collect(),
        }
    }

    pub fn array_contains(path: FieldPath, value: impl Into<Value>) -> Self {
        Predicate::ArrayContains {
            path,
            value: value.into(),
        }
    }

    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::And(predicates.into_iter().collect())
    }

    /// Evaluate against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::FieldEq { path, value } => doc.get(path) == Some(value),
            Predicate::FieldIn { path, values } => match doc.get(path) {
                Some(actual) => values.contains(actual),
                None => false,
            },
            Predicate::ArrayContains { path, value } => match doc.get(path) {
                Some(Value::Array(items)) => items.contains(value),
                _ => false,
            },
            Predicate::And(predicates) => predicates.iter().all(|p| p.matches(doc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(fields: Value) -> Document {
        Document::new("d1", fields).unwrap()
    }

    #[test]
    fn field_eq_matches_exact_value() {
        let d = doc(json!({"status": "pending"}));
        let path = FieldPath::root("status").unwrap();
        assert!(Predicate::field_eq(path.clone(), "pending").matches(&d));
        assert!(!Predicate::field_eq(path, "accepted").matches(&d));
    }

    #[test]
    fn field_in_over_id_set() {
        let d = doc(json!({"id": "u2"}));
        let path = FieldPath::root("id").unwrap();
        let p = Predicate::field_in(path, [json!("u1"), json!("u2")]);
        assert!(p.matches(&d));
    }

    #[test]
    fn array_contains_requires_array_field() {
        let d = doc(json!({"participants": ["u1", "u2"], "name": "trip"}));
        let participants = FieldPath::root("participants").unwrap();
        assert!(Predicate::array_contains(participants.clone(), "u1").matches(&d));
        assert!(!Predicate::array_contains(participants, "u3").matches(&d));

        let name = FieldPath::root("name").unwrap();
        assert!(!Predicate::array_contains(name, "trip").matches(&d));
    }

    #[test]
    fn and_requires_all() {
        let d = doc(json!({"from": "a", "to": "b", "status": "pending"}));
        let p = Predicate::and([
            Predicate::field_eq(FieldPath::root("from").unwrap(), "a"),
            Predicate::field_eq(FieldPath::root("to").unwrap(), "b"),
            Predicate::field_eq(FieldPath::root("status").unwrap(), "pending"),
        ]);
        assert!(p.matches(&d));

        let p = Predicate::and([
            Predicate::field_eq(FieldPath::root("from").unwrap(), "a"),
            Predicate::field_eq(FieldPath::root("status").unwrap(), "accepted"),
        ]);
        assert!(!p.matches(&d));
    }
}
