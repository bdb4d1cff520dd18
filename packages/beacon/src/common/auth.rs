//! Identity collaborator.
//!
//! Every workflow operation that acts on behalf of a user resolves the
//! actor through this seam; an absent actor fails with
//! [`BeaconError::NotAuthenticated`] before any store traffic happens.

use async_trait::async_trait;

use crate::common::UserId;
use crate::error::{BeaconError, Result};

/// External authentication/identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The currently signed-in user, if any.
    async fn current_user_id(&self) -> Option<UserId>;
}

/// Resolve the current actor or fail with `NotAuthenticated`.
pub async fn require_user(identity: &dyn IdentityProvider) -> Result<UserId> {
    identity
        .current_user_id()
        .await
        .ok_or(BeaconError::NotAuthenticated)
}
