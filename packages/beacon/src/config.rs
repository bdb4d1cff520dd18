use anyhow::Result;
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Expo access token for higher push rate limits (optional)
    pub expo_access_token: Option<String>,
    /// Greeting used to seed a newly provisioned direct chat
    pub direct_chat_greeting: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            expo_access_token: env::var("EXPO_ACCESS_TOKEN").ok(),
            direct_chat_greeting: env::var("DIRECT_CHAT_GREETING")
                .unwrap_or_else(|_| crate::domains::chats::DIRECT_CHAT_GREETING.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expo_access_token: None,
            direct_chat_greeting: crate::domains::chats::DIRECT_CHAT_GREETING.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_canned_greeting() {
        let config = Config::default();
        assert!(!config.direct_chat_greeting.is_empty());
    }
}
