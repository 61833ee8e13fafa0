//! Configuration management.
//!
//! Settings are read from an optional TOML file layered under environment
//! variables prefixed with `BECAS_`, using `__` between section and key.
//!
//! # Configuration File Format
//!
//! ```toml
//! [auth]
//! email = "you@example.com"
//! tool = "my-pipeline"
//!
//! [request]
//! timeout_secs = 120
//! secure = true
//! accept_invalid_certs = false
//! min_interval_ms = 500
//!
//! [service]
//! endpoint_prefix = "bioinformatics.ua.pt/becas/api/"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! # Environment Variables
//!
//! - `BECAS_AUTH__EMAIL`, `BECAS_AUTH__TOOL`
//! - `BECAS_REQUEST__TIMEOUT_SECS`, `BECAS_REQUEST__SECURE`,
//!   `BECAS_REQUEST__ACCEPT_INVALID_CERTS`, `BECAS_REQUEST__MIN_INTERVAL_MS`
//! - `BECAS_SERVICE__ENDPOINT_PREFIX`
//! - `BECAS_LOGGING__LEVEL`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{ClientConfig, DEFAULT_ENDPOINT_PREFIX, DEFAULT_TIMEOUT};
use crate::models::{Credentials, DEFAULT_TOOL};
use crate::utils::DEFAULT_MIN_INTERVAL;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BECAS";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub request: RequestConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API authentication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Contact email sent with every request
    #[serde(default)]
    pub email: Option<String>,

    /// Tool name sent with every request
    #[serde(default = "default_tool")]
    pub tool: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: None,
            tool: default_tool(),
        }
    }
}

fn default_tool() -> String {
    DEFAULT_TOOL.to_string()
}

/// Request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub secure: bool,

    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            secure: false,
            accept_invalid_certs: false,
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_min_interval_ms() -> u64 {
    DEFAULT_MIN_INTERVAL.as_millis() as u64
}

/// Remote service location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_endpoint_prefix")]
    pub endpoint_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint_prefix: default_endpoint_prefix(),
        }
    }
}

fn default_endpoint_prefix() -> String {
    DEFAULT_ENDPOINT_PREFIX.to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Client settings derived from this configuration
    pub fn client_config(&self) -> ClientConfig {
        let credentials = Credentials::new(self.auth.email.clone().unwrap_or_default())
            .tool(self.auth.tool.clone());

        ClientConfig::new(credentials)
            .timeout(Duration::from_secs(self.request.timeout_secs))
            .secure(self.request.secure)
            .accept_invalid_certs(self.request.accept_invalid_certs)
            .endpoint_prefix(self.service.endpoint_prefix.clone())
            .min_request_interval(Duration::from_millis(self.request.min_interval_ms))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Load configuration from an optional file plus `BECAS_*` environment
/// variables. A missing `path` means environment and defaults only.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Default location of the user configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("becas").join("config.toml"))
}

/// Find a configuration file in the default locations: the user config
/// directory, then `./becas.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    default_config_path()
        .into_iter()
        .chain(std::iter::once(PathBuf::from("becas.toml")))
        .find(|path| path.is_file())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
