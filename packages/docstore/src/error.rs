//! Typed errors for document-store operations.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match
//! on failure classes instead of string-matching messages.

use thiserror::Error;

/// Errors that can occur during document-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document does not exist (returned by `update` on a missing document)
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A field path was empty or traversed a non-object value
    #[error("invalid field path: {reason}")]
    InvalidPath { reason: String },

    /// Entity could not be encoded into / decoded from document fields
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document fields must be a JSON object
    #[error("document fields must be an object, got {got}")]
    NotAnObject { got: &'static str },

    /// The backing store failed or timed out
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The change-feed subscription was closed by the store
    #[error("subscription closed")]
    SubscriptionClosed,
}

impl StoreError {
    /// Wrap an arbitrary backend failure.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
