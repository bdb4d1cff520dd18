//! Chat provisioning and group administration.
//!
//! Ensures a chat entity exists per relationship and keeps participant and
//! admin membership consistent under the admin-set rules: the creator is
//! admin_ids[0], only the creator demotes admins, and the set never
//! empties. Admin mutation is read-modify-write with no lock; under true
//! concurrency the last writer wins.

use std::sync::Arc;

use docstore::{to_fields, DocumentStore, FieldPath, FieldUpdate, Predicate, WriteOp};
use serde_json::json;
use tracing::info;

use crate::common::{require_user, ChatId, IdentityProvider, UserId};
use crate::domains::chats::models::{Chat, ChatMessage};
use crate::domains::notifications::NotificationFanout;
use crate::domains::profiles::ProfileStore;
use crate::error::{BeaconError, Result};

/// Collection holding one document per chat.
pub const CHATS: &str = "chats";

/// Collection holding chat messages (this core writes system messages only).
pub const MESSAGES: &str = "messages";

/// Greeting seeded into a freshly provisioned direct chat.
pub const DIRECT_CHAT_GREETING: &str = "You are now connected. Say hello!";

/// Provisions chats and manages group membership/admin state.
#[derive(Clone)]
pub struct ChatProvisioner {
    store: Arc<dyn DocumentStore>,
    profiles: ProfileStore,
    fanout: NotificationFanout,
    identity: Arc<dyn IdentityProvider>,
    greeting: String,
}

impl ChatProvisioner {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        profiles: ProfileStore,
        fanout: NotificationFanout,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            profiles,
            fanout,
            identity,
            greeting: DIRECT_CHAT_GREETING.to_string(),
        }
    }

    /// Override the direct-chat greeting (from configuration).
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Ensure a direct chat exists for the pair; idempotent.
    ///
    /// Returns the existing chat's id when one already holds exactly
    /// these two participants.
    pub async fn ensure_direct_chat(&self, user_a: &UserId, user_b: &UserId) -> Result<ChatId> {
        if user_a == user_b {
            return Err(BeaconError::InvalidInput {
                reason: "a direct chat needs two distinct users".into(),
            });
        }

        let candidates = self
            .store
            .query(
                CHATS,
                &Predicate::array_contains(FieldPath::root("participants")?, user_a.as_str()),
            )
            .await?;
        for doc in candidates {
            let chat: Chat = doc.decode()?;
            if chat.participants.len() == 2 && chat.is_participant(user_b) {
                return Ok(chat.id);
            }
        }

        let profiles = self
            .profiles
            .get_many(&[user_a.clone(), user_b.clone()])
            .await?;
        let chat = Chat::direct(user_a, user_b, &self.greeting, &profiles);
        self.store
            .set(CHATS, &chat.id.to_string(), to_fields(&chat)?)
            .await?;

        info!(chat_id = %chat.id, %user_a, %user_b, "direct chat provisioned");
        Ok(chat.id)
    }

    /// Create a group chat. The caller becomes the sole admin; every
    /// other participant receives a group-invite notification.
    pub async fn create_group_chat(
        &self,
        name: &str,
        participant_ids: &[UserId],
    ) -> Result<ChatId> {
        let creator = require_user(self.identity.as_ref()).await?;

        let name = name.trim();
        if name.is_empty() {
            return Err(BeaconError::InvalidInput {
                reason: "group name is empty".into(),
            });
        }

        let mut others: Vec<UserId> = Vec::new();
        for id in participant_ids {
            if *id != creator && !others.contains(id) {
                others.push(id.clone());
            }
        }
        if others.len() < 2 {
            return Err(BeaconError::InsufficientParticipants);
        }

        let creator_profile = self.profiles.require(&creator).await?;

        let mut participants = vec![creator.clone()];
        participants.extend(others.iter().cloned());
        let profiles = self.profiles.get_many(&participants).await?;

        let chat = Chat::group(&creator, name, participants, &profiles);
        self.store
            .set(CHATS, &chat.id.to_string(), to_fields(&chat)?)
            .await?;

        info!(chat_id = %chat.id, %creator, name, "group chat created");
        self.fanout
            .notify_group_invite(&others, &creator_profile, &chat)
            .await;

        Ok(chat.id)
    }

    /// Rename a group. Admins only.
    pub async fn rename_group(&self, chat_id: ChatId, new_name: &str) -> Result<()> {
        let requester = require_user(self.identity.as_ref()).await?;
        let chat = self.load(chat_id).await?;

        if !chat.is_admin(&requester) {
            return Err(BeaconError::NotAuthorized {
                action: "rename this group",
            });
        }
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(BeaconError::InvalidInput {
                reason: "group name is empty".into(),
            });
        }

        self.update_chat(
            chat_id,
            vec![FieldUpdate::set(FieldPath::root("name")?, json!(new_name))],
        )
        .await?;
        info!(%chat_id, %requester, new_name, "group renamed");
        Ok(())
    }

    /// Promote a participant to admin. Admins only.
    pub async fn add_admin(&self, chat_id: ChatId, target: &UserId) -> Result<()> {
        let requester = require_user(self.identity.as_ref()).await?;
        let chat = self.load(chat_id).await?;

        if !chat.is_admin(&requester) {
            return Err(BeaconError::NotAuthorized {
                action: "manage admins",
            });
        }
        if !chat.is_participant(target) {
            return Err(BeaconError::NotParticipant {
                user_id: target.clone(),
            });
        }
        if chat.is_admin(target) {
            return Err(BeaconError::AlreadyAdmin {
                user_id: target.clone(),
            });
        }

        let mut admin_ids = chat.admin_ids;
        admin_ids.push(target.clone());
        self.write_admin_ids(chat_id, &admin_ids).await?;
        info!(%chat_id, %requester, %target, "admin added");
        Ok(())
    }

    /// Demote an admin. Only the original creator (admin_ids[0]) may
    /// demote, the creator can never be demoted, and the admin set can
    /// never empty. Demoting a non-admin is a no-op.
    pub async fn remove_admin(&self, chat_id: ChatId, target: &UserId) -> Result<()> {
        let requester = require_user(self.identity.as_ref()).await?;
        let chat = self.load(chat_id).await?;

        if chat.creator() != Some(&requester) {
            return Err(BeaconError::NotAuthorized {
                action: "demote admins",
            });
        }
        if chat.creator() == Some(target) {
            return Err(BeaconError::CannotRemoveCreator);
        }
        if !chat.is_admin(target) {
            return Ok(());
        }

        let admin_ids: Vec<UserId> = chat
            .admin_ids
            .into_iter()
            .filter(|id| id != target)
            .collect();
        if admin_ids.is_empty() {
            return Err(BeaconError::MustRetainOneAdmin);
        }

        self.write_admin_ids(chat_id, &admin_ids).await?;
        info!(%chat_id, %requester, %target, "admin removed");
        Ok(())
    }

    /// Add participants to a group. Admins only. Ids already present are
    /// silently dropped; an empty remainder fails. A synthetic system
    /// message announces the change.
    pub async fn add_participants(&self, chat_id: ChatId, new_ids: &[UserId]) -> Result<()> {
        let requester = require_user(self.identity.as_ref()).await?;
        let chat = self.load(chat_id).await?;

        if !chat.is_admin(&requester) {
            return Err(BeaconError::NotAuthorized {
                action: "add participants",
            });
        }

        let mut added: Vec<UserId> = Vec::new();
        for id in new_ids {
            if !chat.is_participant(id) && !added.contains(id) {
                added.push(id.clone());
            }
        }
        if added.is_empty() {
            return Err(BeaconError::NoNewParticipants);
        }

        let requester_profile = self.profiles.require(&requester).await?;
        let added_profiles = self.profiles.get_many(&added).await?;
        let display_name = |id: &UserId| {
            added_profiles
                .iter()
                .find(|p| &p.id == id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| id.to_string())
        };

        let names: Vec<String> = added.iter().map(display_name).collect();
        let announcement = format!("{} added {}", requester_profile.name, names.join(", "));
        let message = ChatMessage::system(chat_id, announcement.clone());

        let mut participants = chat.participants.clone();
        participants.extend(added.iter().cloned());

        let mut updates = vec![
            FieldUpdate::set(
                FieldPath::root("participants")?,
                json!(participants
                    .iter()
                    .map(UserId::as_str)
                    .collect::<Vec<_>>()),
            ),
            FieldUpdate::set(FieldPath::root("last_message")?, json!(announcement)),
            FieldUpdate::set(
                FieldPath::root("last_message_at")?,
                serde_json::to_value(message.sent_at).map_err(docstore::StoreError::from)?,
            ),
        ];
        for profile in &added_profiles {
            updates.push(FieldUpdate::set(
                FieldPath::from_segments(["nicknames", profile.id.as_str()])?,
                json!(profile.username),
            ));
            if let Some(photo_url) = &profile.photo_url {
                updates.push(FieldUpdate::set(
                    FieldPath::from_segments(["participant_photos", profile.id.as_str()])?,
                    json!(photo_url),
                ));
            }
        }
        for id in &added {
            updates.push(FieldUpdate::set(
                FieldPath::from_segments(["unread_counts", id.as_str()])?,
                json!(0),
            ));
        }

        // Best-effort grouping: the chat update and the announcement land
        // together or the call fails visibly.
        self.store
            .run_batch(vec![
                WriteOp::update(CHATS, chat_id.to_string(), updates),
                WriteOp::set(MESSAGES, message.id.to_string(), to_fields(&message)?),
            ])
            .await?;

        info!(%chat_id, %requester, added = added.len(), "participants added");
        Ok(())
    }

    /// All chats the user participates in, most recent activity first.
    pub async fn chats_for(&self, user_id: &UserId) -> Result<Vec<Chat>> {
        let docs = self
            .store
            .query(
                CHATS,
                &Predicate::array_contains(FieldPath::root("participants")?, user_id.as_str()),
            )
            .await?;
        let mut chats: Vec<Chat> = docs
            .into_iter()
            .map(|doc| doc.decode().map_err(BeaconError::from))
            .collect::<Result<_>>()?;
        chats.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(chats)
    }

    /// Fetch a chat by id.
    pub async fn get(&self, chat_id: ChatId) -> Result<Chat> {
        self.load(chat_id).await
    }

    async fn load(&self, chat_id: ChatId) -> Result<Chat> {
        let doc = self
            .store
            .get(CHATS, &chat_id.to_string())
            .await?
            .ok_or(BeaconError::ChatNotFound { id: chat_id })?;
        Ok(doc.decode()?)
    }

    async fn write_admin_ids(&self, chat_id: ChatId, admin_ids: &[UserId]) -> Result<()> {
        let update = FieldUpdate::set(
            FieldPath::root("admin_ids")?,
            json!(admin_ids.iter().map(UserId::as_str).collect::<Vec<_>>()),
        );
        self.update_chat(chat_id, vec![update]).await
    }

    async fn update_chat(&self, chat_id: ChatId, updates: Vec<FieldUpdate>) -> Result<()> {
        self.store
            .update(CHATS, &chat_id.to_string(), &updates)
            .await
            .map_err(|err| match err {
                docstore::StoreError::NotFound { .. } => {
                    BeaconError::ChatNotFound { id: chat_id }
                }
                other => other.into(),
            })
    }
}
