use serde::{Deserialize, Serialize};

use crate::RESET_TOKEN_TTL;

/// Runtime configuration for the identity service
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the frontend that hosts the reset-password page; the
    /// redemption link is `{frontend_base_url}/reset-password/{token}`
    pub frontend_base_url: String,
    /// Reset token lifetime in seconds
    pub token_ttl: u64,
}

impl ServiceConfig {
    /// Read configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let frontend_base_url = std::env::var("APP_FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5177".to_string());
        Self {
            frontend_base_url,
            token_ttl: RESET_TOKEN_TTL,
        }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.frontend_base_url, token)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            frontend_base_url: "http://localhost:5177".to_string(),
            token_ttl: RESET_TOKEN_TTL,
        }
    }
}
