//! Configuration management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use transitsync_fetch::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

use crate::detail::DEFAULT_POLL_INTERVAL;
use crate::error::StoreError;
use crate::filter::DEFAULT_DEBOUNCE;
use crate::persistence::{default_config_path, load_json, save_json};
use crate::repository::CachePolicy;

/// Environment variable consulted for the API key by default.
pub const DEFAULT_API_KEY_ENV: &str = "MBTA_API_KEY";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Polling, debounce and caching settings.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Log level used when no `RUST_LOG` is set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Upstream API settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key stored in the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable that overrides `api_key`.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Polling, debounce and caching settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Detail polling interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Trip query debounce in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Route cache lifetime in seconds; unset keeps routes for the process
    /// lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_cache_ttl_secs: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[allow(clippy::cast_possible_truncation)]
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

#[allow(clippy::cast_possible_truncation)]
fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_key_env", &self.api_key_env)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
            route_cache_ttl_secs: None,
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads configuration from `path`, using defaults when it is missing.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !tokio::fs::try_exists(path).await? {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config: Config = load_json(path).await?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to the default path.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path()).await
    }

    /// Saves configuration to `path`.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Rejects values the controllers cannot run with.
    pub fn validate(&self) -> Result<(), StoreError> {
        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(StoreError::Config(format!(
                "invalid base_url: {}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(StoreError::Config("timeout_secs must be positive".to_string()));
        }
        if self.sync.poll_interval_ms == 0 {
            return Err(StoreError::Config(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the API key, preferring the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(std::env::var(&self.api.api_key_env).ok())
    }

    fn api_key_with(&self, from_env: Option<String>) -> Option<String> {
        from_env
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }

    /// Returns the HTTP client settings.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings::default()
            .with_base_url(self.api.base_url.clone())
            .with_api_key(self.api_key())
            .with_timeout(Duration::from_secs(self.api.timeout_secs))
    }

    /// Returns the detail polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync.poll_interval_ms)
    }

    /// Returns the trip query debounce.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.sync.debounce_ms)
    }

    /// Returns the route cache policy.
    pub fn cache_policy(&self) -> CachePolicy {
        match self.sync.route_cache_ttl_secs {
            Some(secs) => CachePolicy::with_ttl(Duration::from_secs(secs)),
            None => CachePolicy::forever(),
        }
    }
}
