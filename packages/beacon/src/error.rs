//! Typed errors for the relationship core.
//!
//! Every fallible operation surfaces one of these; nothing is silently
//! swallowed except the two documented best-effort paths (per-recipient
//! notification fan-out and per-friend profile enrichment), which log and
//! skip instead.

use thiserror::Error;

use crate::common::{ChatId, NotificationId, RequestId, UserId};
use docstore::StoreError;

/// Errors surfaced by profile, friend, chat, and notification workflows.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// No signed-in user
    #[error("not authenticated")]
    NotAuthenticated,

    /// Friend-request query matched no eligible profile
    #[error("no user matches '{query}'")]
    UserNotFound { query: String },

    /// Profile document missing for a known user id
    #[error("profile not found for user {user_id}")]
    ProfileNotFound { user_id: UserId },

    /// Request id unknown, or the request already reached a terminal state
    #[error("friend request not found: {id}")]
    RequestNotFound { id: RequestId },

    /// Chat id unknown
    #[error("chat not found: {id}")]
    ChatNotFound { id: ChatId },

    /// Notification id unknown
    #[error("notification not found: {id}")]
    NotificationNotFound { id: NotificationId },

    /// A pending request for this ordered pair already exists
    #[error("a pending friend request to {to_user_id} already exists")]
    DuplicatePending { to_user_id: UserId },

    /// An edge to this user already exists in the caller's friend map
    #[error("already friends with {user_id}")]
    AlreadyFriends { user_id: UserId },

    /// The target is not in the caller's friend map
    #[error("{user_id} is not in your friends list")]
    NotFriends { user_id: UserId },

    /// The target is already in the chat's admin set
    #[error("{user_id} is already an admin")]
    AlreadyAdmin { user_id: UserId },

    /// The target is not a participant of the chat
    #[error("{user_id} is not a participant of this chat")]
    NotParticipant { user_id: UserId },

    /// The actor lacks the role the operation requires
    #[error("not authorized to {action}")]
    NotAuthorized { action: &'static str },

    /// The chat creator can never leave the admin set
    #[error("the chat creator cannot be removed from the admin set")]
    CannotRemoveCreator,

    /// A group chat must keep at least one admin
    #[error("a group chat must retain at least one admin")]
    MustRetainOneAdmin,

    /// Malformed caller input (empty name, blank query, ...)
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A group chat needs the creator plus at least two others
    #[error("a group chat needs at least two other participants")]
    InsufficientParticipants,

    /// Every supplied participant is already in the chat
    #[error("no new participants to add")]
    NoNewParticipants,

    /// The document-store collaborator failed or timed out
    #[error("document store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, BeaconError>;
