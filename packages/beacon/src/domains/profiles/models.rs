use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::UserId;

/// UserProfile - one document per user, created on first login.
///
/// Mutated only by the owning user; never deleted by this core. The email
/// and username are both queryable because friend requests resolve either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile_type: ProfileType,
    pub photo_url: Option<String>,
    /// Expo push token, registered by the device on login
    pub push_token: Option<String>,
    pub join_date: DateTime<Utc>,
}

impl UserProfile {
    /// Profile as created on first login: public, no photo, no push token.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            username: username.into(),
            email: email.into(),
            profile_type: ProfileType::Public,
            photo_url: None,
            push_token: None,
            join_date: Utc::now(),
        }
    }
}

/// Profile visibility
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Public,
    Private,
}

impl std::fmt::Display for ProfileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileType::Public => write!(f, "public"),
            ProfileType::Private => write!(f, "private"),
        }
    }
}

impl std::str::FromStr for ProfileType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "public" => Ok(ProfileType::Public),
            "private" => Ok(ProfileType::Private),
            _ => Err(anyhow::anyhow!("Invalid profile type: {}", s)),
        }
    }
}
