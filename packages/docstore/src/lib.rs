//! Document-Store Collaborator Contract
//!
//! The storage seam for applications built over a hosted document
//! database: a small trait ([`DocumentStore`]) covering point reads,
//! predicate queries, whole/partial writes, best-effort batches, and
//! push-based change feeds, plus an in-memory reference implementation
//! ([`MemoryStore`]) for tests and development.
//!
//! # Design
//!
//! - Collaborators are injected, never global: components take an
//!   `Arc<dyn DocumentStore>` at construction.
//! - Partial updates are typed path descriptors ([`FieldUpdate`]),
//!   validated before dispatch, not dynamically assembled key strings.
//! - Subscriptions are explicit handles ([`Subscription`]) owned by the
//!   consumer and released on `close()`/drop.
//! - Batches group writes; they are NOT transactions. Multi-document
//!   sequences are eventually consistent by design.

pub mod batch;
pub mod document;
pub mod error;
pub mod memory;
pub mod path;
pub mod predicate;
pub mod store;
pub mod subscription;

pub use batch::WriteOp;
pub use document::{to_fields, Document};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use path::{FieldPath, FieldUpdate, UpdateOp};
pub use predicate::Predicate;
pub use store::DocumentStore;
pub use subscription::{ChangeKind, DocumentChange, Subscription};
