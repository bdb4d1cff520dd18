//! Notification fan-out.
//!
//! Stateless translation of workflow events into per-recipient
//! notification documents. The loop is failure-isolated: one recipient's
//! failed write is logged and skipped, and never blocks the others or the
//! triggering workflow. Push delivery is best-effort after the store
//! write.

use std::sync::Arc;

use docstore::{to_fields, DocumentStore};
use tracing::warn;

use crate::common::{RequestId, UserId};
use crate::domains::chats::Chat;
use crate::domains::notifications::models::UserNotification;
use crate::domains::profiles::UserProfile;
use crate::push::PushDelivery;

/// Collection holding one document per delivered notification.
pub const NOTIFICATIONS: &str = "notifications";

/// Derives and delivers notification records as workflow side effects.
#[derive(Clone)]
pub struct NotificationFanout {
    store: Arc<dyn DocumentStore>,
    push: Arc<dyn PushDelivery>,
}

impl NotificationFanout {
    pub fn new(store: Arc<dyn DocumentStore>, push: Arc<dyn PushDelivery>) -> Self {
        Self { store, push }
    }

    /// A friend request arrived for `recipient`.
    pub async fn notify_friend_request(
        &self,
        recipient: &UserId,
        sender: &UserProfile,
        request_id: RequestId,
    ) {
        self.deliver(vec![UserNotification::friend_request(
            recipient, sender, request_id,
        )])
        .await;
    }

    /// The original sender's request was accepted.
    pub async fn notify_accepted(&self, sender: &UserId, accepter: &UserProfile) {
        self.deliver(vec![UserNotification::friend_request_accepted(
            sender, accepter,
        )])
        .await;
    }

    /// Every participant except the creator was invited to a new group.
    pub async fn notify_group_invite(
        &self,
        recipients: &[UserId],
        inviter: &UserProfile,
        chat: &Chat,
    ) {
        self.deliver(
            recipients
                .iter()
                .map(|recipient| {
                    UserNotification::group_invite(recipient, inviter, chat.id, &chat.name)
                })
                .collect(),
        )
        .await;
    }

    /// A friend filed an incident report.
    pub async fn notify_friend_report(
        &self,
        recipients: &[UserId],
        reporter: &UserProfile,
        report_id: &str,
    ) {
        self.deliver(
            recipients
                .iter()
                .map(|recipient| UserNotification::friend_report(recipient, reporter, report_id))
                .collect(),
        )
        .await;
    }

    /// A new report was published near the recipients.
    pub async fn notify_new_report(
        &self,
        recipients: &[UserId],
        report_title: &str,
        report_id: &str,
    ) {
        self.deliver(
            recipients
                .iter()
                .map(|recipient| UserNotification::new_report(recipient, report_title, report_id))
                .collect(),
        )
        .await;
    }

    /// Someone commented on the recipient's report.
    pub async fn notify_report_comment(
        &self,
        recipient: &UserId,
        commenter: &UserProfile,
        report_id: &str,
    ) {
        self.deliver(vec![UserNotification::report_comment(
            recipient, commenter, report_id,
        )])
        .await;
    }

    /// Persist each notification independently, then attempt push.
    /// Partial delivery across recipients is accepted and not rolled back.
    pub async fn deliver(&self, notifications: Vec<UserNotification>) {
        for notification in notifications {
            let fields = match to_fields(&notification) {
                Ok(fields) => fields,
                Err(err) => {
                    warn!(user_id = %notification.user_id, %err, "skipping unencodable notification");
                    continue;
                }
            };
            if let Err(err) = self
                .store
                .set(NOTIFICATIONS, &notification.id.to_string(), fields)
                .await
            {
                warn!(user_id = %notification.user_id, %err, "notification write failed, skipping recipient");
                continue;
            }

            if let Err(err) = self
                .push
                .send(&notification.user_id, &notification.title, &notification.message)
                .await
            {
                warn!(user_id = %notification.user_id, %err, "push delivery failed");
            }
        }
    }
}
