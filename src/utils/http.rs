//! HTTP client utilities.

use reqwest::Client;
use std::time::Duration;

use crate::client::BecasError;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Transport settings for the underlying reqwest client
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Total time allowed for one request
    pub timeout: Duration,
    /// Skip certificate verification (only for hosts with broken CA stores)
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            accept_invalid_certs: false,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Build a reqwest client from transport settings
pub fn build_client(settings: &HttpSettings) -> Result<Client, BecasError> {
    if settings.accept_invalid_certs {
        tracing::warn!("TLS certificate verification is disabled");
    }

    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.timeout)
        .connect_timeout(settings.timeout.min(Duration::from_secs(30)))
        .danger_accept_invalid_certs(settings.accept_invalid_certs)
        .build()
        .map_err(|e| BecasError::Internal(format!("Failed to create HTTP client: {}", e)))
}
