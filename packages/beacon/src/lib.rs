// Beacon - Relationship Core
//
// This crate keeps friend relationships, pending requests, chat
// existence, and notification fan-out consistent across independent
// collections of a remote document store with no cross-collection
// transactions.
//
// Architecture: every component takes its collaborators (document store,
// identity provider, push delivery) at construction. Workflows call each
// other directly:
//
//   FriendRequestWorkflow.respond(accept)
//       -> FriendshipLedger.create_edge      (both directions, not atomic)
//       -> ChatProvisioner.ensure_direct_chat (idempotent)
//       -> NotificationFanout                 (per-recipient, best-effort)

pub mod common;
pub mod config;
pub mod domains;
pub mod error;
pub mod push;
pub mod testing;

pub use config::Config;
pub use error::{BeaconError, Result};

// Re-export core types at crate root
pub use common::{
    require_user, ChatId, Id, IdentityProvider, MessageId, NotificationId, RequestId, UserId,
};
pub use domains::{
    chats::{Chat, ChatMessage, ChatProvisioner, CHATS, DIRECT_CHAT_GREETING, MESSAGES},
    friends::{
        Friend, FriendEdge, FriendRequest, FriendRequestWorkflow, FriendshipLedger, RequestStatus,
        FRIENDSHIPS, FRIEND_REQUESTS,
    },
    notifications::{
        NotificationChange, NotificationFanout, NotificationFeed, NotificationKind,
        NotificationWatch, UserNotification, NOTIFICATIONS,
    },
    profiles::{ProfileStore, ProfileType, UserProfile, PROFILES},
};
pub use push::{ExpoPushClient, PushDelivery};
