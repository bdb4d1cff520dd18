use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{RequestId, UserId};
use crate::domains::profiles::UserProfile;

/// FriendRequest - created by the sender, answered once by the recipient.
///
/// Sender display fields are denormalized onto the request so the
/// recipient's inbox renders without extra profile reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: RequestId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub from_user_email: String,
    pub from_user_name: String,
}

impl FriendRequest {
    /// A fresh pending request from `sender` to `to_user_id`.
    pub fn new(sender: &UserProfile, to_user_id: UserId) -> Self {
        Self {
            id: RequestId::new(),
            from_user_id: sender.id.clone(),
            to_user_id,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            from_user_email: sender.email.clone(),
            from_user_name: sender.name.clone(),
        }
    }
}

/// Friend request status. Transitions pending -> accepted | rejected
/// exactly once; terminal states are immutable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Accepted => write!(f, "accepted"),
            RequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid request status: {}", s)),
        }
    }
}

/// One directed friendship edge as stored in the owner's edge map.
///
/// The nickname is private to the owner; the counterpart never sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendEdge {
    pub added_at: DateTime<Utc>,
    pub nickname: String,
}

/// A friend as returned by `list_friends`: the profile enriched with the
/// viewer's private edge metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Friend {
    pub profile: UserProfile,
    pub nickname: String,
    pub added_at: DateTime<Utc>,
}
