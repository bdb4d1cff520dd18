//! Testing utilities including mock collaborators.
//!
//! These let applications (and this crate's own tests) exercise the
//! workflows without a real identity provider, push transport, or remote
//! document store.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use docstore::{
    Document, DocumentStore, FieldUpdate, Predicate, StoreError, Subscription, WriteOp,
};

use crate::common::{IdentityProvider, UserId};
use crate::push::PushDelivery;

// =============================================================================
// StaticIdentity
// =============================================================================

/// Identity provider with an explicitly controlled current user.
///
/// Tests switch actors mid-scenario with `sign_in`.
#[derive(Default)]
pub struct StaticIdentity {
    current: RwLock<Option<UserId>>,
}

impl StaticIdentity {
    /// Nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Signed in as the given user.
    pub fn signed_in(user_id: impl Into<UserId>) -> Self {
        Self {
            current: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<UserId>) {
        *self.current.write().unwrap() = Some(user_id.into());
    }

    pub fn sign_out(&self) {
        *self.current.write().unwrap() = None;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user_id(&self) -> Option<UserId> {
        self.current.read().unwrap().clone()
    }
}

// =============================================================================
// RecordingPush
// =============================================================================

/// Record of one push send.
#[derive(Debug, Clone, PartialEq)]
pub struct PushRecord {
    pub user_id: UserId,
    pub title: String,
    pub body: String,
}

/// Push delivery that records every send for assertions. Can be switched
/// into a failing mode to exercise best-effort paths.
#[derive(Default)]
pub struct RecordingPush {
    sent: RwLock<Vec<PushRecord>>,
    failing: RwLock<bool>,
}

impl RecordingPush {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pushes sent so far.
    pub fn sent(&self) -> Vec<PushRecord> {
        self.sent.read().unwrap().clone()
    }

    /// Make every subsequent send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        *self.failing.write().unwrap() = failing;
    }
}

#[async_trait]
impl PushDelivery for RecordingPush {
    async fn send(&self, user_id: &UserId, title: &str, body: &str) -> anyhow::Result<()> {
        if *self.failing.read().unwrap() {
            anyhow::bail!("push transport unavailable");
        }
        self.sent.write().unwrap().push(PushRecord {
            user_id: user_id.clone(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// FailingStore
// =============================================================================

/// Store wrapper that injects write failures, for exercising partial
/// failure and fan-out isolation.
///
/// Reads always pass through. A write fails when its document id is in
/// the failing id set, or (for `set`/`merge`) when its fields match one
/// of the failing predicates for that collection.
pub struct FailingStore {
    inner: Arc<dyn DocumentStore>,
    fail_ids: RwLock<HashSet<String>>,
    fail_matching: RwLock<Vec<(String, Predicate)>>,
}

impl FailingStore {
    pub fn wrap(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            fail_ids: RwLock::new(HashSet::new()),
            fail_matching: RwLock::new(Vec::new()),
        }
    }

    /// Fail any write addressed to this document id.
    pub fn fail_id(&self, id: impl Into<String>) {
        self.fail_ids.write().unwrap().insert(id.into());
    }

    /// Fail `set`/`merge` writes into `collection` whose fields match the
    /// predicate (useful when document ids are minted inside the code
    /// under test).
    pub fn fail_matching(&self, collection: impl Into<String>, predicate: Predicate) {
        self.fail_matching
            .write()
            .unwrap()
            .push((collection.into(), predicate));
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        self.fail_ids.write().unwrap().clear();
        self.fail_matching.write().unwrap().clear();
    }

    fn check_id(&self, id: &str) -> docstore::Result<()> {
        if self.fail_ids.read().unwrap().contains(id) {
            return Err(injected_failure());
        }
        Ok(())
    }

    fn check_fields(&self, collection: &str, id: &str, fields: &Value) -> docstore::Result<()> {
        self.check_id(id)?;
        let doc = Document::new(id, fields.clone())?;
        for (failing_collection, predicate) in self.fail_matching.read().unwrap().iter() {
            if failing_collection == collection && predicate.matches(&doc) {
                return Err(injected_failure());
            }
        }
        Ok(())
    }
}

fn injected_failure() -> StoreError {
    StoreError::backend(std::io::Error::other("injected write failure"))
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, collection: &str, id: &str) -> docstore::Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> docstore::Result<Vec<Document>> {
        self.inner.query(collection, predicate).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Value) -> docstore::Result<()> {
        self.check_fields(collection, id, &fields)?;
        self.inner.set(collection, id, fields).await
    }

    async fn merge(&self, collection: &str, id: &str, fields: Value) -> docstore::Result<()> {
        self.check_fields(collection, id, &fields)?;
        self.inner.merge(collection, id, fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> docstore::Result<()> {
        self.check_id(id)?;
        self.inner.update(collection, id, updates).await
    }

    async fn delete(&self, collection: &str, id: &str) -> docstore::Result<()> {
        self.check_id(id)?;
        self.inner.delete(collection, id).await
    }

    async fn run_batch(&self, writes: Vec<WriteOp>) -> docstore::Result<()> {
        for write in &writes {
            match write {
                WriteOp::Set { collection, id, fields }
                | WriteOp::Merge { collection, id, fields } => {
                    self.check_fields(collection, id, fields)?
                }
                WriteOp::Update { id, .. } | WriteOp::Delete { id, .. } => self.check_id(id)?,
            }
        }
        self.inner.run_batch(writes).await
    }

    async fn subscribe(
        &self,
        collection: &str,
        predicate: Predicate,
    ) -> docstore::Result<Subscription> {
        self.inner.subscribe(collection, predicate).await
    }
}
