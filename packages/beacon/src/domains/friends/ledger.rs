//! The friendship ledger: per-user directed edge maps.
//!
//! Each user owns one document in `friendships/` whose fields are keyed by
//! friend id. Symmetry is maintained by writing both directions, not by
//! the storage layer: the two writes are independent, and a crash between
//! them leaves a one-directional edge until the accept is retried. All
//! read paths key off the viewer's own edge map, so the asymmetry only
//! ever shows as "B sees A but A does not see B".

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use docstore::{to_fields, DocumentStore, FieldPath, FieldUpdate, StoreError};
use serde_json::json;
use tracing::{info, warn};

use crate::common::UserId;
use crate::domains::friends::models::{Friend, FriendEdge};
use crate::domains::profiles::ProfileStore;
use crate::error::{BeaconError, Result};

/// Collection holding one edge-map document per user id.
pub const FRIENDSHIPS: &str = "friendships";

/// Maintains bidirectional friendship edges with per-edge nicknames.
#[derive(Clone)]
pub struct FriendshipLedger {
    store: Arc<dyn DocumentStore>,
    profiles: ProfileStore,
}

impl FriendshipLedger {
    pub fn new(store: Arc<dyn DocumentStore>, profiles: ProfileStore) -> Self {
        Self { store, profiles }
    }

    /// Create the edge pair for a newly accepted friendship.
    ///
    /// Each direction's nickname is initialized to the *other* party's
    /// current username. Re-creating an existing edge is not an error;
    /// the fresh `added_at` simply wins.
    pub async fn create_edge(&self, user_a: &UserId, user_b: &UserId) -> Result<()> {
        let profile_a = self.profiles.require(user_a).await?;
        let profile_b = self.profiles.require(user_b).await?;
        let now = Utc::now();

        // Two independent writes - no cross-collection transaction exists.
        self.write_edge(
            user_a,
            user_b,
            FriendEdge {
                added_at: now,
                nickname: profile_b.username,
            },
        )
        .await?;
        self.write_edge(
            user_b,
            user_a,
            FriendEdge {
                added_at: now,
                nickname: profile_a.username,
            },
        )
        .await?;

        info!(%user_a, %user_b, "friendship edges created");
        Ok(())
    }

    /// Remove both directions of an edge (unfriend). Same
    /// eventual-consistency contract as `create_edge`.
    pub async fn remove_edge(&self, user_a: &UserId, user_b: &UserId) -> Result<()> {
        self.delete_edge(user_a, user_b).await?;
        self.delete_edge(user_b, user_a).await?;
        info!(%user_a, %user_b, "friendship edges removed");
        Ok(())
    }

    /// The owner's directed edge to `friend`, if present.
    pub async fn edge_of(&self, owner: &UserId, friend: &UserId) -> Result<Option<FriendEdge>> {
        let Some(doc) = self.store.get(FRIENDSHIPS, owner.as_str()).await? else {
            return Ok(None);
        };
        let path = FieldPath::root(friend.as_str())?;
        match doc.get(&path) {
            Some(value) => {
                let edge = serde_json::from_value(value.clone()).map_err(StoreError::from)?;
                Ok(Some(edge))
            }
            None => Ok(None),
        }
    }

    /// Membership test keyed off the viewer's own edge map.
    pub async fn are_friends(&self, owner: &UserId, other: &UserId) -> Result<bool> {
        Ok(self.edge_of(owner, other).await?.is_some())
    }

    /// Set the owner's private nickname for a friend. Only the owner's
    /// directed edge changes; the friend never sees it.
    pub async fn update_nickname(
        &self,
        owner: &UserId,
        friend: &UserId,
        nickname: &str,
    ) -> Result<()> {
        if self.edge_of(owner, friend).await?.is_none() {
            return Err(BeaconError::NotFriends {
                user_id: friend.clone(),
            });
        }

        let update = FieldUpdate::set(
            FieldPath::from_segments([friend.as_str(), "nickname"])?,
            json!(nickname),
        );
        self.store
            .update(FRIENDSHIPS, owner.as_str(), &[update])
            .await
            .map_err(|err| match err {
                // Raced with an unfriend: the edge is gone either way.
                StoreError::NotFound { .. } => BeaconError::NotFriends {
                    user_id: friend.clone(),
                },
                other => other.into(),
            })
    }

    /// All of the owner's friends, enriched with profiles and the owner's
    /// nickname overlay.
    ///
    /// Fails open: a friend whose profile fetch fails (or whose edge
    /// record is malformed) is omitted with a warning rather than failing
    /// the whole call.
    pub async fn list_friends(&self, owner: &UserId) -> Result<Vec<Friend>> {
        let Some(doc) = self.store.get(FRIENDSHIPS, owner.as_str()).await? else {
            return Ok(Vec::new());
        };

        let mut friends = Vec::with_capacity(doc.fields.len());
        for (friend_id, value) in &doc.fields {
            let edge: FriendEdge = match serde_json::from_value(value.clone()) {
                Ok(edge) => edge,
                Err(err) => {
                    warn!(%owner, %friend_id, %err, "skipping malformed friendship edge");
                    continue;
                }
            };

            let friend_id = UserId::new(friend_id.clone());
            match self.profiles.get(&friend_id).await {
                Ok(Some(profile)) => friends.push(Friend {
                    profile,
                    nickname: edge.nickname,
                    added_at: edge.added_at,
                }),
                Ok(None) => {
                    warn!(%owner, %friend_id, "friend has no profile, omitting");
                }
                Err(err) => {
                    warn!(%owner, %friend_id, %err, "friend profile fetch failed, omitting");
                }
            }
        }
        Ok(friends)
    }

    async fn write_edge(&self, owner: &UserId, friend: &UserId, edge: FriendEdge) -> Result<()> {
        let mut fields = BTreeMap::new();
        fields.insert(friend.as_str(), edge);
        self.store
            .merge(FRIENDSHIPS, owner.as_str(), to_fields(&fields)?)
            .await?;
        Ok(())
    }

    async fn delete_edge(&self, owner: &UserId, friend: &UserId) -> Result<()> {
        let update = FieldUpdate::delete(FieldPath::root(friend.as_str())?);
        match self.store.update(FRIENDSHIPS, owner.as_str(), &[update]).await {
            Ok(()) => Ok(()),
            // Owner has no edge map at all: nothing to remove.
            Err(StoreError::NotFound { .. }) => Ok(()),
            Err(other) => Err(other.into()),
        }
    }
}
