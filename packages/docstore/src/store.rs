//! The document-store collaborator contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::WriteOp;
use crate::document::Document;
use crate::error::Result;
use crate::path::FieldUpdate;
use crate::predicate::Predicate;
use crate::subscription::Subscription;

/// Remote document store, injected into every component that needs one.
///
/// All operations are suspend points; callers must treat each as
/// independently cancellable by the collaborator. No ordering guarantees
/// exist across collections, and `run_batch` is best-effort grouping, not
/// a transaction.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Fetch all documents matching the predicate.
    ///
    /// Result order is implementation-defined but must be stable for an
    /// unchanged collection (callers rely on deterministic scans for
    /// tie-breaking).
    async fn query(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Document>>;

    /// Overwrite a document, creating it if absent.
    async fn set(&self, collection: &str, id: &str, fields: Value) -> Result<()>;

    /// Deep-merge fields into a document, creating it if absent.
    ///
    /// Object values merge recursively; any other value replaces.
    async fn merge(&self, collection: &str, id: &str, fields: Value) -> Result<()>;

    /// Apply partial updates to an existing document.
    ///
    /// Fails with [`crate::StoreError::NotFound`] if the document is absent.
    async fn update(&self, collection: &str, id: &str, updates: &[FieldUpdate]) -> Result<()>;

    /// Delete a document. Deleting an absent document is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Apply writes in order, stopping at the first failure.
    async fn run_batch(&self, writes: Vec<WriteOp>) -> Result<()>;

    /// Open a change feed over documents matching the predicate.
    ///
    /// The feed first delivers the current matches as `Added` changes, then
    /// incremental changes, so a consumer that (re)subscribes always
    /// converges on the live state. Changes are never silently dropped
    /// while the handle is open; the feed ends when the handle is closed.
    async fn subscribe(&self, collection: &str, predicate: Predicate) -> Result<Subscription>;
}
