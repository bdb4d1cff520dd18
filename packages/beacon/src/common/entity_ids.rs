//! Typed ID definitions for all domain entities.
//!
//! Entities minted by this core get `Id<T>` (v7 UUID) aliases. Users are
//! different: their ids are issued by the external identity provider as
//! opaque strings, so [`UserId`] wraps a `String` instead of a `Uuid`.

use serde::{Deserialize, Serialize};

// Re-export the core Id type
pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for FriendRequest entities.
pub struct FriendRequestEntity;

/// Marker type for Chat entities.
pub struct ChatEntity;

/// Marker type for ChatMessage entities.
pub struct MessageEntity;

/// Marker type for UserNotification entities.
pub struct NotificationEntity;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for FriendRequest entities.
pub type RequestId = Id<FriendRequestEntity>;

/// Typed ID for Chat entities.
pub type ChatId = Id<ChatEntity>;

/// Typed ID for ChatMessage entities.
pub type MessageId = Id<MessageEntity>;

/// Typed ID for UserNotification entities.
pub type NotificationId = Id<NotificationEntity>;

// ============================================================================
// UserId - foreign-minted identifier
// ============================================================================

/// Opaque user identifier issued by the identity provider.
///
/// Serializes transparently as a string, so it can key JSON maps
/// (nicknames, unread counts) directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
