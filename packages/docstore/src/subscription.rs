//! Change-feed subscriptions.
//!
//! A subscription is an explicit handle owned by the consumer: changes are
//! pulled with [`Subscription::next`] (or via [`Subscription::into_stream`])
//! and the feed is released with [`Subscription::close`] or on drop. No
//! implicit lifecycle-bound callbacks.

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::document::Document;

/// What happened to a document relative to the subscribed predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Document newly matches (including the initial snapshot)
    Added,
    /// Document still matches with new contents
    Modified,
    /// Document was deleted or no longer matches
    Removed,
}

/// One change delivered on a subscription.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub collection: String,
    pub document: Document,
}

/// Handle to an active change feed.
///
/// Dropping the handle cancels the feed; the store prunes the watcher on
/// its next delivery attempt.
#[derive(Debug)]
pub struct Subscription {
    receiver: Option<mpsc::UnboundedReceiver<DocumentChange>>,
}

impl Subscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<DocumentChange>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Wait for the next change. Returns `None` once the feed is closed,
    /// either by [`Subscription::close`] or by the store shutting down.
    pub async fn next(&mut self) -> Option<DocumentChange> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => None,
        }
    }

    /// Non-blocking poll used by tests and drain loops.
    pub fn try_next(&mut self) -> Option<DocumentChange> {
        self.receiver.as_mut()?.try_recv().ok()
    }

    /// Release the feed. Idempotent; after closing, `next` returns `None`.
    pub fn close(&mut self) {
        self.receiver = None;
    }

    /// Whether the feed has been closed locally.
    pub fn is_closed(&self) -> bool {
        self.receiver.is_none()
    }

    /// Convert into a `Stream` of changes.
    pub fn into_stream(mut self) -> UnboundedReceiverStream<DocumentChange> {
        match self.receiver.take() {
            Some(receiver) => UnboundedReceiverStream::new(receiver),
            None => {
                // Closed subscription: an immediately-ended stream.
                let (_tx, rx) = mpsc::unbounded_channel();
                UnboundedReceiverStream::new(rx)
            }
        }
    }
}
