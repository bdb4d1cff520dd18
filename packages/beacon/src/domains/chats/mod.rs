//! Chats: direct chats provisioned on friendship, explicit group chats.

pub mod models;
pub mod provisioner;

pub use models::{Chat, ChatMessage};
pub use provisioner::{ChatProvisioner, CHATS, DIRECT_CHAT_GREETING, MESSAGES};
