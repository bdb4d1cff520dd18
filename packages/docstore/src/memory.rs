//! In-memory store implementation for testing and development.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use crate::batch::WriteOp;
use crate::document::Document;
use crate::error::{Result, StoreError};
use crate::path::{apply_updates, FieldUpdate};
use crate::predicate::Predicate;
use crate::store::DocumentStore;
use crate::subscription::{ChangeKind, DocumentChange, Subscription};

/// In-memory document store.
///
/// Useful for testing and development; data is lost on restart. Documents
/// are kept in insertion order per collection, so query results and scans
/// are deterministic.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    collections: HashMap<String, IndexMap<String, Map<String, Value>>>,
    watchers: Vec<Watcher>,
}

struct Watcher {
    collection: String,
    predicate: Predicate,
    sender: mpsc::UnboundedSender<DocumentChange>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                collections: HashMap::new(),
                watchers: Vec::new(),
            }),
        }
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.inner
            .read()
            .unwrap()
            .collections
            .get(collection)
            .map_or(0, IndexMap::len)
    }

    /// Drop all documents and watchers.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.collections.clear();
        inner.watchers.clear();
    }

    fn require_object(fields: Value) -> Result<Map<String, Value>> {
        match Document::new(String::new(), fields) {
            Ok(doc) => Ok(doc.fields),
            Err(err) => Err(err),
        }
    }

    fn apply_set(inner: &mut Inner, collection: &str, id: &str, fields: Value) -> Result<()> {
        let fields = Self::require_object(fields)?;
        let entries = inner.collections.entry(collection.to_string()).or_default();
        let before = entries.insert(id.to_string(), fields.clone());
        Self::notify(&mut inner.watchers, collection, id, before, Some(fields));
        Ok(())
    }

    fn apply_merge(inner: &mut Inner, collection: &str, id: &str, fields: Value) -> Result<()> {
        let incoming = Self::require_object(fields)?;
        let entries = inner.collections.entry(collection.to_string()).or_default();
        let before = entries.get(id).cloned();

        let mut merged = before.clone().unwrap_or_default();
        deep_merge(&mut merged, incoming);
        entries.insert(id.to_string(), merged.clone());

        Self::notify(&mut inner.watchers, collection, id, before, Some(merged));
        Ok(())
    }

    fn apply_update(
        inner: &mut Inner,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> Result<()> {
        let entries = inner.collections.entry(collection.to_string()).or_default();
        let before = entries.get(id).cloned().ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        let mut after = before.clone();
        apply_updates(&mut after, updates)?;
        entries.insert(id.to_string(), after.clone());

        Self::notify(&mut inner.watchers, collection, id, Some(before), Some(after));
        Ok(())
    }

    fn apply_delete(inner: &mut Inner, collection: &str, id: &str) -> Result<()> {
        let before = inner
            .collections
            .get_mut(collection)
            .and_then(|entries| entries.shift_remove(id));
        if before.is_some() {
            Self::notify(&mut inner.watchers, collection, id, before, None);
        }
        Ok(())
    }

    /// Deliver a change to every watcher it concerns and prune dead feeds.
    fn notify(
        watchers: &mut Vec<Watcher>,
        collection: &str,
        id: &str,
        before: Option<Map<String, Value>>,
        after: Option<Map<String, Value>>,
    ) {
        let before_doc = before.map(|fields| Document {
            id: id.to_string(),
            fields,
        });
        let after_doc = after.map(|fields| Document {
            id: id.to_string(),
            fields,
        });

        let mut pruned = 0usize;
        watchers.retain(|watcher| {
            if watcher.collection != collection {
                return true;
            }

            let matched_before = before_doc
                .as_ref()
                .filter(|doc| watcher.predicate.matches(doc));
            let matched_after = after_doc
                .as_ref()
                .filter(|doc| watcher.predicate.matches(doc));

            let (kind, document) = match (matched_before, matched_after) {
                (None, Some(doc)) => (ChangeKind::Added, doc.clone()),
                (Some(_), Some(doc)) => (ChangeKind::Modified, doc.clone()),
                (Some(doc), None) => (ChangeKind::Removed, doc.clone()),
                (None, None) => return true,
            };
            let change = DocumentChange {
                kind,
                collection: collection.to_string(),
                document,
            };

            if watcher.sender.send(change).is_err() {
                pruned += 1;
                return false;
            }
            true
        });

        if pruned > 0 {
            debug!(collection, pruned, "pruned closed change-feed watchers");
        }
    }
}

/// Recursively merge `incoming` into `target`: objects merge key-wise,
/// everything else replaces.
fn deep_merge(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(new)) => {
                deep_merge(existing, new);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .collections
            .get(collection)
            .and_then(|entries| entries.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Document>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .collections
            .get(collection)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .filter(|doc| predicate.matches(doc))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        Self::apply_set(&mut inner, collection, id, fields)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        Self::apply_merge(&mut inner, collection, id, fields)
    }

    async fn update(&self, collection: &str, id: &str, updates: &[FieldUpdate]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        Self::apply_update(&mut inner, collection, id, updates)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        Self::apply_delete(&mut inner, collection, id)
    }

    async fn run_batch(&self, writes: Vec<WriteOp>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        for write in writes {
            match write {
                WriteOp::Set {
                    collection,
                    id,
                    fields,
                } => Self::apply_set(&mut inner, &collection, &id, fields)?,
                WriteOp::Merge {
                    collection,
                    id,
                    fields,
                } => Self::apply_merge(&mut inner, &collection, &id, fields)?,
                WriteOp::Update {
                    collection,
                    id,
                    updates,
                } => Self::apply_update(&mut inner, &collection, &id, &updates)?,
                WriteOp::Delete { collection, id } => {
                    Self::apply_delete(&mut inner, &collection, &id)?
                }
            }
        }
        Ok(())
    }

    async fn subscribe(&self, collection: &str, predicate: Predicate) -> Result<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();

        // Register and snapshot under one lock so no change is missed
        // between the initial snapshot and the live feed.
        let mut inner = self.inner.write().unwrap();
        if let Some(entries) = inner.collections.get(collection) {
            for (id, fields) in entries {
                let doc = Document {
                    id: id.clone(),
                    fields: fields.clone(),
                };
                if predicate.matches(&doc) {
                    let _ = sender.send(DocumentChange {
                        kind: ChangeKind::Added,
                        collection: collection.to_string(),
                        document: doc,
                    });
                }
            }
        }
        inner.watchers.push(Watcher {
            collection: collection.to_string(),
            predicate,
            sender,
        });

        Ok(Subscription::new(receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FieldPath;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_delete_roundtrip() {
        let store = MemoryStore::new();
        store
            .set("profiles", "u1", json!({"name": "Ada"}))
            .await
            .unwrap();
        assert_eq!(store.count("profiles"), 1);

        let doc = store.get("profiles", "u1").await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], json!("Ada"));

        store.delete("profiles", "u1").await.unwrap();
        assert_eq!(store.count("profiles"), 0);
        assert!(store.get("profiles", "u1").await.unwrap().is_none());

        // Deleting again is a no-op
        store.delete("profiles", "u1").await.unwrap();
    }

    #[tokio::test]
    async fn query_results_preserve_insertion_order() {
        let store = MemoryStore::new();
        for id in ["a", "b", "c"] {
            store
                .set("items", id, json!({"kind": "x", "id": id}))
                .await
                .unwrap();
        }

        let predicate = Predicate::field_eq(FieldPath::root("kind").unwrap(), "x");
        let results = store.query("items", &predicate).await.unwrap();
        let ids: Vec<_> = results.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn merge_is_deep_for_objects() {
        let store = MemoryStore::new();
        store
            .set("friendships", "u1", json!({"u2": {"nickname": "Bee"}}))
            .await
            .unwrap();
        store
            .merge("friendships", "u1", json!({"u3": {"nickname": "Cee"}}))
            .await
            .unwrap();

        let doc = store.get("friendships", "u1").await.unwrap().unwrap();
        assert_eq!(doc.fields["u2"]["nickname"], json!("Bee"));
        assert_eq!(doc.fields["u3"]["nickname"], json!("Cee"));
    }

    #[tokio::test]
    async fn merge_creates_missing_document() {
        let store = MemoryStore::new();
        store
            .merge("friendships", "u9", json!({"u1": {"nickname": "A"}}))
            .await
            .unwrap();
        assert!(store.get("friendships", "u9").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_fails_on_missing_document() {
        let store = MemoryStore::new();
        let update = FieldUpdate::set(FieldPath::root("name").unwrap(), json!("x"));
        let err = store.update("profiles", "ghost", &[update]).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn batch_applies_in_order_and_stops_at_first_failure() {
        let store = MemoryStore::new();
        let result = store
            .run_batch(vec![
                WriteOp::set("chats", "c1", json!({"name": "Trip"})),
                WriteOp::update(
                    "chats",
                    "missing",
                    vec![FieldUpdate::set(FieldPath::root("name").unwrap(), json!("x"))],
                ),
                WriteOp::set("chats", "c2", json!({"name": "Other"})),
            ])
            .await;

        assert!(result.is_err());
        // Best-effort: the first write landed, the third never ran.
        assert!(store.get("chats", "c1").await.unwrap().is_some());
        assert!(store.get("chats", "c2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn subscribe_delivers_snapshot_then_changes() {
        let store = MemoryStore::new();
        store
            .set("notifications", "n1", json!({"user_id": "u1", "is_read": false}))
            .await
            .unwrap();

        let predicate = Predicate::field_eq(FieldPath::root("user_id").unwrap(), "u1");
        let mut sub = store.subscribe("notifications", predicate).await.unwrap();

        // Initial snapshot
        let change = sub.next().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Added);
        assert_eq!(change.document.id, "n1");

        // Live add
        store
            .set("notifications", "n2", json!({"user_id": "u1", "is_read": false}))
            .await
            .unwrap();
        let change = sub.next().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Added);
        assert_eq!(change.document.id, "n2");

        // Modification
        store
            .update(
                "notifications",
                "n2",
                &[FieldUpdate::set(FieldPath::root("is_read").unwrap(), json!(true))],
            )
            .await
            .unwrap();
        let change = sub.next().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Modified);

        // Another user's notification is not delivered
        store
            .set("notifications", "n3", json!({"user_id": "u2"}))
            .await
            .unwrap();
        assert!(sub.try_next().is_none());

        // Removal
        store.delete("notifications", "n1").await.unwrap();
        let change = sub.next().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Removed);
        assert_eq!(change.document.id, "n1");
    }

    #[tokio::test]
    async fn closed_subscription_stops_delivering() {
        let store = MemoryStore::new();
        let predicate = Predicate::field_eq(FieldPath::root("user_id").unwrap(), "u1");
        let mut sub = store.subscribe("notifications", predicate).await.unwrap();
        sub.close();

        store
            .set("notifications", "n1", json!({"user_id": "u1"}))
            .await
            .unwrap();
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn document_leaving_predicate_is_removed() {
        let store = MemoryStore::new();
        store
            .set("requests", "r1", json!({"to": "u1", "status": "pending"}))
            .await
            .unwrap();

        let predicate = Predicate::and([
            Predicate::field_eq(FieldPath::root("to").unwrap(), "u1"),
            Predicate::field_eq(FieldPath::root("status").unwrap(), "pending"),
        ]);
        let mut sub = store.subscribe("requests", predicate).await.unwrap();
        assert_eq!(sub.next().await.unwrap().kind, ChangeKind::Added);

        store
            .update(
                "requests",
                "r1",
                &[FieldUpdate::set(FieldPath::root("status").unwrap(), json!("accepted"))],
            )
            .await
            .unwrap();
        assert_eq!(sub.next().await.unwrap().kind, ChangeKind::Removed);
    }
}
