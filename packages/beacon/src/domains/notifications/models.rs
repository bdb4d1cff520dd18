use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{ChatId, NotificationId, RequestId, UserId};
use crate::domains::profiles::UserProfile;

/// In-app notification record. Created by whichever workflow triggers it;
/// afterwards only `is_read` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserNotification {
    pub id: NotificationId,
    /// Recipient
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    /// Deep-link payload for the client (request/chat/report ids)
    pub data: BTreeMap<String, String>,
}

/// Notification kinds, one per triggering workflow event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    FriendRequest,
    FriendRequestAccepted,
    FriendReport,
    NewReport,
    ReportComment,
    GroupInvite,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::FriendRequest => write!(f, "friendRequest"),
            NotificationKind::FriendRequestAccepted => write!(f, "friendRequestAccepted"),
            NotificationKind::FriendReport => write!(f, "friendReport"),
            NotificationKind::NewReport => write!(f, "newReport"),
            NotificationKind::ReportComment => write!(f, "reportComment"),
            NotificationKind::GroupInvite => write!(f, "groupInvite"),
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "friendRequest" => Ok(NotificationKind::FriendRequest),
            "friendRequestAccepted" => Ok(NotificationKind::FriendRequestAccepted),
            "friendReport" => Ok(NotificationKind::FriendReport),
            "newReport" => Ok(NotificationKind::NewReport),
            "reportComment" => Ok(NotificationKind::ReportComment),
            "groupInvite" => Ok(NotificationKind::GroupInvite),
            _ => Err(anyhow::anyhow!("Invalid notification kind: {}", s)),
        }
    }
}

// =============================================================================
// Templates - one fixed title/message pair per kind
// =============================================================================

impl UserNotification {
    fn build(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: String,
        data: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            title: title.into(),
            message,
            created_at: Utc::now(),
            is_read: false,
            data,
        }
    }

    pub fn friend_request(recipient: &UserId, sender: &UserProfile, request_id: RequestId) -> Self {
        Self::build(
            recipient.clone(),
            NotificationKind::FriendRequest,
            "New friend request",
            format!("{} sent you a friend request", sender.name),
            BTreeMap::from([
                ("requestId".to_string(), request_id.to_string()),
                ("userId".to_string(), sender.id.to_string()),
            ]),
        )
    }

    pub fn friend_request_accepted(recipient: &UserId, accepter: &UserProfile) -> Self {
        Self::build(
            recipient.clone(),
            NotificationKind::FriendRequestAccepted,
            "Friend request accepted",
            format!("{} accepted your friend request", accepter.name),
            BTreeMap::from([("userId".to_string(), accepter.id.to_string())]),
        )
    }

    pub fn group_invite(recipient: &UserId, inviter: &UserProfile, chat_id: ChatId, chat_name: &str) -> Self {
        Self::build(
            recipient.clone(),
            NotificationKind::GroupInvite,
            "Added to a group",
            format!("{} added you to \"{}\"", inviter.name, chat_name),
            BTreeMap::from([("chatId".to_string(), chat_id.to_string())]),
        )
    }

    pub fn friend_report(recipient: &UserId, reporter: &UserProfile, report_id: &str) -> Self {
        Self::build(
            recipient.clone(),
            NotificationKind::FriendReport,
            "Friend safety report",
            format!("{} reported an incident", reporter.name),
            BTreeMap::from([
                ("reportId".to_string(), report_id.to_string()),
                ("userId".to_string(), reporter.id.to_string()),
            ]),
        )
    }

    pub fn new_report(recipient: &UserId, report_title: &str, report_id: &str) -> Self {
        Self::build(
            recipient.clone(),
            NotificationKind::NewReport,
            "New report in your area",
            format!("\"{}\" was just reported nearby", report_title),
            BTreeMap::from([("reportId".to_string(), report_id.to_string())]),
        )
    }

    pub fn report_comment(recipient: &UserId, commenter: &UserProfile, report_id: &str) -> Self {
        Self::build(
            recipient.clone(),
            NotificationKind::ReportComment,
            "New comment on your report",
            format!("{} commented on your report", commenter.name),
            BTreeMap::from([
                ("reportId".to_string(), report_id.to_string()),
                ("userId".to_string(), commenter.id.to_string()),
            ]),
        )
    }
}
