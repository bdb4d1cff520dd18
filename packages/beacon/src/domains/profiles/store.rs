//! Profile CRUD over the document-store collaborator.

use std::sync::Arc;

use docstore::{to_fields, DocumentStore, FieldPath, FieldUpdate, Predicate, StoreError};
use serde_json::{json, Value};

use crate::common::UserId;
use crate::domains::profiles::models::{ProfileType, UserProfile};
use crate::error::{BeaconError, Result};

/// Collection holding one profile document per user id.
pub const PROFILES: &str = "profiles";

/// CRUD and lookup for user profiles.
#[derive(Clone)]
pub struct ProfileStore {
    store: Arc<dyn DocumentStore>,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a profile (first login). Overwrites any previous document.
    pub async fn create(&self, profile: &UserProfile) -> Result<()> {
        self.store
            .set(PROFILES, profile.id.as_str(), to_fields(profile)?)
            .await?;
        Ok(())
    }

    /// Fetch a profile, `None` if the user has none yet.
    pub async fn get(&self, user_id: &UserId) -> Result<Option<UserProfile>> {
        match self.store.get(PROFILES, user_id.as_str()).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Fetch a profile that must exist.
    pub async fn require(&self, user_id: &UserId) -> Result<UserProfile> {
        self.get(user_id).await?.ok_or_else(|| BeaconError::ProfileNotFound {
            user_id: user_id.clone(),
        })
    }

    /// Batched lookup by id set. Missing ids are simply absent from the
    /// result; callers that care must check.
    pub async fn get_many(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let predicate = Predicate::field_in(
            FieldPath::root("id")?,
            user_ids.iter().map(|id| json!(id.as_str())),
        );
        let docs = self.store.query(PROFILES, &predicate).await?;
        docs.into_iter()
            .map(|doc| doc.decode().map_err(BeaconError::from))
            .collect()
    }

    pub async fn update_name(&self, user_id: &UserId, name: &str) -> Result<()> {
        self.update_field(user_id, "name", json!(name)).await
    }

    pub async fn set_photo_url(&self, user_id: &UserId, photo_url: &str) -> Result<()> {
        self.update_field(user_id, "photo_url", json!(photo_url)).await
    }

    pub async fn set_profile_type(&self, user_id: &UserId, profile_type: ProfileType) -> Result<()> {
        self.update_field(user_id, "profile_type", json!(profile_type.to_string()))
            .await
    }

    pub async fn set_push_token(&self, user_id: &UserId, push_token: Option<&str>) -> Result<()> {
        self.update_field(user_id, "push_token", json!(push_token)).await
    }

    /// Resolve a friend-request query against profiles.
    ///
    /// Exact email matches are scanned before exact username matches, and
    /// the first candidate whose id differs from `exclude` wins. No
    /// eligible candidate means `None` - callers treat that the same as
    /// "not found".
    pub async fn resolve_query(&self, query: &str, exclude: &UserId) -> Result<Option<UserProfile>> {
        let by_email = self
            .store
            .query(
                PROFILES,
                &Predicate::field_eq(FieldPath::root("email")?, query),
            )
            .await?;
        let by_username = self
            .store
            .query(
                PROFILES,
                &Predicate::field_eq(FieldPath::root("username")?, query),
            )
            .await?;

        for doc in by_email.into_iter().chain(by_username) {
            let profile: UserProfile = doc.decode()?;
            if &profile.id != exclude {
                return Ok(Some(profile));
            }
        }
        Ok(None)
    }

    async fn update_field(&self, user_id: &UserId, field: &str, value: Value) -> Result<()> {
        let update = FieldUpdate::set(FieldPath::root(field)?, value);
        self.store
            .update(PROFILES, user_id.as_str(), &[update])
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => BeaconError::ProfileNotFound {
                    user_id: user_id.clone(),
                },
                other => other.into(),
            })
    }
}
