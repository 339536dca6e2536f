//! Transfer client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{cdse, http};

/// Configuration for the HTTP transfer client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// OData product download base URL
    pub download_base_url: String,
    /// OAuth2 token endpoint
    pub token_url: String,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            download_base_url: cdse::DOWNLOAD_BASE_URL.to_string(),
            token_url: cdse::TOKEN_URL.to_string(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
        }
    }
}

impl TransferConfig {
    /// Connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
