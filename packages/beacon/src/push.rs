//! Push-delivery collaborator.
//!
//! Fan-out treats push as fire-and-forget: a failed send is logged and
//! never fails the triggering workflow.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::common::UserId;
use crate::domains::profiles::ProfileStore;

/// External push-notification delivery.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    /// Deliver a push to one user. No delivery confirmation is required.
    async fn send(&self, user_id: &UserId, title: &str, body: &str) -> Result<()>;
}

/// Expo Push Notification client.
///
/// Resolves the recipient's Expo push token from their profile; users
/// without a registered token are skipped silently.
pub struct ExpoPushClient {
    client: Client,
    access_token: Option<String>,
    profiles: ProfileStore,
}

#[derive(Debug, Serialize)]
struct ExpoMessage {
    to: String,
    title: String,
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    data: Vec<ExpoTicket>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    #[allow(dead_code)]
    id: Option<String>,
    #[allow(dead_code)]
    message: Option<String>,
}

const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

impl ExpoPushClient {
    pub fn new(access_token: Option<String>, profiles: ProfileStore) -> Self {
        Self {
            client: Client::new(),
            access_token,
            profiles,
        }
    }
}

#[async_trait]
impl PushDelivery for ExpoPushClient {
    async fn send(&self, user_id: &UserId, title: &str, body: &str) -> Result<()> {
        let Some(profile) = self.profiles.get(user_id).await? else {
            debug!(%user_id, "no profile, skipping push");
            return Ok(());
        };
        let Some(token) = profile.push_token else {
            debug!(%user_id, "no push token registered, skipping push");
            return Ok(());
        };

        let message = ExpoMessage {
            to: token,
            title: title.to_string(),
            body: body.to_string(),
            sound: Some("default".to_string()),
        };

        let mut request = self.client.post(EXPO_PUSH_URL).json(&message);
        if let Some(access_token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", access_token));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            error!(%user_id, %status, "Expo push failed: {}", body);
            anyhow::bail!("Expo push API error {}: {}", status, body);
        }

        let expo_response: ExpoResponse = response.json().await?;
        for ticket in &expo_response.data {
            if ticket.status == "error" {
                error!(%user_id, "Expo ticket error: {:?}", ticket);
                anyhow::bail!("Expo ticket error: {:?}", ticket);
            }
        }

        info!(%user_id, "push notification sent");
        Ok(())
    }
}
