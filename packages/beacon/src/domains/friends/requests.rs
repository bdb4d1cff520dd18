//! Friend-request workflow.
//!
//! Orchestrates the multi-collection sequence behind sending and answering
//! friend requests: guard checks, the status write, edge creation, direct
//! chat provisioning, and notification fan-out. Writes span independent
//! collections with no transaction; the ordering here (status first, then
//! edges, then chat) keeps every intermediate state recoverable by
//! retrying the accept.

use std::sync::Arc;

use docstore::{to_fields, DocumentStore, FieldPath, FieldUpdate, Predicate, StoreError};
use serde_json::json;
use tracing::info;

use crate::common::{require_user, IdentityProvider, RequestId, UserId};
use crate::domains::chats::ChatProvisioner;
use crate::domains::friends::ledger::FriendshipLedger;
use crate::domains::friends::models::{FriendRequest, RequestStatus};
use crate::domains::notifications::NotificationFanout;
use crate::domains::profiles::ProfileStore;
use crate::error::{BeaconError, Result};

/// Collection holding one document per friend request.
pub const FRIEND_REQUESTS: &str = "friend_requests";

/// Create/accept/reject friend requests.
#[derive(Clone)]
pub struct FriendRequestWorkflow {
    store: Arc<dyn DocumentStore>,
    profiles: ProfileStore,
    ledger: FriendshipLedger,
    chats: ChatProvisioner,
    fanout: NotificationFanout,
    identity: Arc<dyn IdentityProvider>,
}

impl FriendRequestWorkflow {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        profiles: ProfileStore,
        ledger: FriendshipLedger,
        chats: ChatProvisioner,
        fanout: NotificationFanout,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            profiles,
            ledger,
            chats,
            fanout,
            identity,
        }
    }

    /// Send a friend request to the user matching `query` (exact email or
    /// exact username, the caller excluded).
    pub async fn send_request(&self, query: &str) -> Result<RequestId> {
        let actor = require_user(self.identity.as_ref()).await?;

        let query = query.trim();
        if query.is_empty() {
            return Err(BeaconError::InvalidInput {
                reason: "search query is empty".into(),
            });
        }

        let target = self
            .profiles
            .resolve_query(query, &actor)
            .await?
            .ok_or_else(|| BeaconError::UserNotFound {
                query: query.to_string(),
            })?;

        if self.ledger.are_friends(&actor, &target.id).await? {
            return Err(BeaconError::AlreadyFriends {
                user_id: target.id.clone(),
            });
        }

        if self.pending_between(&actor, &target.id).await? {
            return Err(BeaconError::DuplicatePending {
                to_user_id: target.id.clone(),
            });
        }

        let sender = self.profiles.require(&actor).await?;
        let request = FriendRequest::new(&sender, target.id.clone());
        self.store
            .set(FRIEND_REQUESTS, &request.id.to_string(), to_fields(&request)?)
            .await?;

        info!(from = %actor, to = %target.id, request_id = %request.id, "friend request sent");
        self.fanout
            .notify_friend_request(&target.id, &sender, request.id)
            .await;

        Ok(request.id)
    }

    /// Accept or reject a pending request.
    ///
    /// A request that is unknown or already terminal fails with
    /// `RequestNotFound` - answering twice is rejected, not silently
    /// ignored, so a duplicate accept can never create a second chat or
    /// edge pair through this path.
    pub async fn respond(&self, request_id: RequestId, accept: bool) -> Result<()> {
        let actor = require_user(self.identity.as_ref()).await?;

        let doc = self
            .store
            .get(FRIEND_REQUESTS, &request_id.to_string())
            .await?
            .ok_or(BeaconError::RequestNotFound { id: request_id })?;
        let request: FriendRequest = doc.decode()?;

        if request.status.is_terminal() {
            return Err(BeaconError::RequestNotFound { id: request_id });
        }
        if request.to_user_id != actor {
            return Err(BeaconError::NotAuthorized {
                action: "respond to this friend request",
            });
        }

        if accept {
            self.set_status(request_id, RequestStatus::Accepted).await?;
            self.ledger
                .create_edge(&request.from_user_id, &request.to_user_id)
                .await?;
            self.chats
                .ensure_direct_chat(&request.from_user_id, &request.to_user_id)
                .await?;

            let accepter = self.profiles.require(&actor).await?;
            info!(request_id = %request_id, from = %request.from_user_id, to = %actor, "friend request accepted");
            self.fanout
                .notify_accepted(&request.from_user_id, &accepter)
                .await;
        } else {
            self.set_status(request_id, RequestStatus::Rejected).await?;
            info!(request_id = %request_id, from = %request.from_user_id, to = %actor, "friend request rejected");
        }

        Ok(())
    }

    /// Incoming pending requests for a user (inbox view).
    pub async fn pending_for(&self, user_id: &UserId) -> Result<Vec<FriendRequest>> {
        let predicate = Predicate::and([
            Predicate::field_eq(FieldPath::root("to_user_id")?, user_id.as_str()),
            Predicate::field_eq(FieldPath::root("status")?, RequestStatus::Pending.to_string()),
        ]);
        let docs = self.store.query(FRIEND_REQUESTS, &predicate).await?;
        docs.into_iter()
            .map(|doc| doc.decode().map_err(BeaconError::from))
            .collect()
    }

    /// Whether a pending request already exists for the ordered
    /// (from, to) pair.
    async fn pending_between(&self, from: &UserId, to: &UserId) -> Result<bool> {
        let predicate = Predicate::and([
            Predicate::field_eq(FieldPath::root("from_user_id")?, from.as_str()),
            Predicate::field_eq(FieldPath::root("to_user_id")?, to.as_str()),
            Predicate::field_eq(FieldPath::root("status")?, RequestStatus::Pending.to_string()),
        ]);
        Ok(!self.store.query(FRIEND_REQUESTS, &predicate).await?.is_empty())
    }

    async fn set_status(&self, request_id: RequestId, status: RequestStatus) -> Result<()> {
        let update = FieldUpdate::set(FieldPath::root("status")?, json!(status.to_string()));
        self.store
            .update(FRIEND_REQUESTS, &request_id.to_string(), &[update])
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => BeaconError::RequestNotFound { id: request_id },
                other => other.into(),
            })
    }
}
