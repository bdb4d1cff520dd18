//! Notification read surface: the live feed and read-state flips.

use std::sync::Arc;

use docstore::{
    ChangeKind, DocumentStore, FieldPath, FieldUpdate, Predicate, StoreError, Subscription, WriteOp,
};
use serde_json::json;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::common::{NotificationId, UserId};
use crate::domains::notifications::fanout::NOTIFICATIONS;
use crate::domains::notifications::models::UserNotification;
use crate::error::{BeaconError, Result};

/// A typed change from a notification watch.
#[derive(Debug, Clone)]
pub struct NotificationChange {
    pub kind: ChangeKind,
    pub notification: UserNotification,
}

/// Handle over a user's live notification feed.
///
/// Owns the underlying store subscription; `close()` (or drop) releases
/// it on every exit path.
#[derive(Debug)]
pub struct NotificationWatch {
    subscription: Subscription,
}

impl NotificationWatch {
    /// Next change, skipping records that fail to decode.
    pub async fn next(&mut self) -> Option<NotificationChange> {
        loop {
            let change = self.subscription.next().await?;
            match change.document.decode::<UserNotification>() {
                Ok(notification) => {
                    return Some(NotificationChange {
                        kind: change.kind,
                        notification,
                    })
                }
                Err(err) => {
                    warn!(document_id = %change.document.id, %err, "skipping malformed notification");
                }
            }
        }
    }

    /// Release the feed. After closing, `next` returns `None`.
    pub fn close(&mut self) {
        self.subscription.close();
    }

    /// Convert into a `Stream` of typed changes, skipping records that
    /// fail to decode.
    pub fn into_stream(self) -> impl Stream<Item = NotificationChange> {
        self.subscription.into_stream().filter_map(|change| {
            match change.document.decode::<UserNotification>() {
                Ok(notification) => Some(NotificationChange {
                    kind: change.kind,
                    notification,
                }),
                Err(err) => {
                    warn!(document_id = %change.document.id, %err, "skipping malformed notification");
                    None
                }
            }
        })
    }
}

/// Read-side access to a user's notifications.
#[derive(Clone)]
pub struct NotificationFeed {
    store: Arc<dyn DocumentStore>,
}

impl NotificationFeed {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Open a live feed of the user's notifications. The current
    /// notifications arrive first as `Added` changes, then increments.
    pub async fn watch(&self, user_id: &UserId) -> Result<NotificationWatch> {
        let predicate = Predicate::field_eq(FieldPath::root("user_id")?, user_id.as_str());
        let subscription = self.store.subscribe(NOTIFICATIONS, predicate).await?;
        Ok(NotificationWatch { subscription })
    }

    /// Unread notifications for a user, oldest first.
    pub async fn unread(&self, user_id: &UserId) -> Result<Vec<UserNotification>> {
        let predicate = Predicate::and([
            Predicate::field_eq(FieldPath::root("user_id")?, user_id.as_str()),
            Predicate::field_eq(FieldPath::root("is_read")?, false),
        ]);
        let docs = self.store.query(NOTIFICATIONS, &predicate).await?;
        docs.into_iter()
            .map(|doc| doc.decode().map_err(BeaconError::from))
            .collect()
    }

    /// Flip one notification to read - the only mutation notifications
    /// ever receive.
    pub async fn mark_read(&self, notification_id: NotificationId) -> Result<()> {
        let update = FieldUpdate::set(FieldPath::root("is_read")?, json!(true));
        self.store
            .update(NOTIFICATIONS, &notification_id.to_string(), &[update])
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => BeaconError::NotificationNotFound {
                    id: notification_id,
                },
                other => other.into(),
            })
    }

    /// Flip every unread notification for a user. Returns how many were
    /// flipped.
    pub async fn mark_all_read(&self, user_id: &UserId) -> Result<usize> {
        let unread = self.unread(user_id).await?;
        if unread.is_empty() {
            return Ok(0);
        }

        let writes: Vec<WriteOp> = unread
            .iter()
            .map(|notification| {
                Ok(WriteOp::update(
                    NOTIFICATIONS,
                    notification.id.to_string(),
                    vec![FieldUpdate::set(FieldPath::root("is_read")?, json!(true))],
                ))
            })
            .collect::<Result<_>>()?;
        let count = writes.len();
        self.store.run_batch(writes).await?;
        Ok(count)
    }
}
