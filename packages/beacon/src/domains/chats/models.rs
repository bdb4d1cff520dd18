use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{ChatId, MessageId, UserId};
use crate::domains::profiles::UserProfile;

/// Chat - direct (exactly two participants, no admins) or group
/// (three or more participants, non-empty admin set).
///
/// Invariants for groups: admin_ids is a non-empty subset of participants
/// and admin_ids[0] is the creator, who can never be demoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub participants: Vec<UserId>,
    pub name: String,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub admin_ids: Vec<UserId>,
    pub unread_counts: BTreeMap<UserId, i64>,
    pub participant_photos: BTreeMap<UserId, String>,
    pub nicknames: BTreeMap<UserId, String>,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// A direct chat between two users, seeded with a greeting.
    pub fn direct(
        user_a: &UserId,
        user_b: &UserId,
        greeting: &str,
        profiles: &[UserProfile],
    ) -> Self {
        let participants = vec![user_a.clone(), user_b.clone()];
        let now = Utc::now();
        // Direct chats start with an empty photo map; clients resolve the
        // counterpart's photo from their profile.
        Self {
            id: ChatId::new(),
            participants: participants.clone(),
            name: String::new(),
            last_message: greeting.to_string(),
            last_message_at: now,
            admin_ids: Vec::new(),
            unread_counts: participants.iter().map(|id| (id.clone(), 0)).collect(),
            participant_photos: BTreeMap::new(),
            nicknames: profiles
                .iter()
                .map(|p| (p.id.clone(), p.username.clone()))
                .collect(),
            created_at: now,
        }
    }

    /// A group chat; the creator is the sole initial admin.
    pub fn group(
        creator: &UserId,
        name: &str,
        participants: Vec<UserId>,
        profiles: &[UserProfile],
    ) -> Self {
        let now = Utc::now();
        let mut chat = Self {
            id: ChatId::new(),
            unread_counts: participants.iter().map(|id| (id.clone(), 0)).collect(),
            participants,
            name: name.to_string(),
            last_message: String::new(),
            last_message_at: now,
            admin_ids: vec![creator.clone()],
            participant_photos: BTreeMap::new(),
            nicknames: BTreeMap::new(),
            created_at: now,
        };
        chat.seed_member_maps(profiles);
        chat
    }

    /// Groups carry a non-empty admin set; direct chats never do.
    pub fn is_group(&self) -> bool {
        !self.admin_ids.is_empty()
    }

    pub fn is_participant(&self, user_id: &UserId) -> bool {
        self.participants.contains(user_id)
    }

    pub fn is_admin(&self, user_id: &UserId) -> bool {
        self.admin_ids.contains(user_id)
    }

    /// The original creator: admin_ids[0] for groups, absent for direct
    /// chats.
    pub fn creator(&self) -> Option<&UserId> {
        self.admin_ids.first()
    }

    fn seed_member_maps(&mut self, profiles: &[UserProfile]) {
        for profile in profiles {
            self.nicknames
                .insert(profile.id.clone(), profile.username.clone());
            if let Some(photo_url) = &profile.photo_url {
                self.participant_photos
                    .insert(profile.id.clone(), photo_url.clone());
            }
        }
    }
}

/// A message inside a chat. This core only writes system messages
/// (participant-change announcements); user messaging lives elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub chat_id: ChatId,
    /// None marks a synthetic system message
    pub sender_id: Option<UserId>,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn system(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            chat_id,
            sender_id: None,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}
