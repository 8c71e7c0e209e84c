//! Session configuration.
//!
//! Configuration is read from `AETHER_*` environment variables, falling back
//! to the constants in [`aether_core::defaults`].
//!
//! # Example
//!
//! ```rust,no_run
//! use aether_session::config::SessionConfig;
//!
//! let config = SessionConfig::from_env().expect("invalid configuration");
//! config.validate().expect("invalid configuration");
//! ```

use std::env;
use std::time::Duration;

use aether_core::{defaults, ServerMode};
use thiserror::Error;
use tracing::debug;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidVar { var: &'static str, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub const ENV_LOCAL_URL: &str = "AETHER_LOCAL_URL";
pub const ENV_CLOUD_URL: &str = "AETHER_CLOUD_URL";
pub const ENV_SERVER_MODE: &str = "AETHER_SERVER_MODE";
pub const ENV_PROBE_TIMEOUT_SECS: &str = "AETHER_PROBE_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AETHER_REQUEST_TIMEOUT_SECS";
pub const ENV_SUGGEST_DEBOUNCE_MS: &str = "AETHER_SUGGEST_DEBOUNCE_MS";

/// Everything a session needs to know about its deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL of the local engine.
    pub local_url: String,
    /// Base URL of the hosted engine.
    pub cloud_url: String,
    /// Mode selected when the session starts.
    pub default_mode: ServerMode,
    /// Per-request timeout of the health probe.
    pub probe_timeout: Duration,
    /// Timeout for suggest, search and upload requests.
    pub request_timeout: Duration,
    /// Quiet period of the suggestion debouncer.
    pub suggest_debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            local_url: defaults::LOCAL_URL.to_string(),
            cloud_url: defaults::CLOUD_URL.to_string(),
            default_mode: ServerMode::default(),
            probe_timeout: Duration::from_secs(defaults::PROBE_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            suggest_debounce: Duration::from_millis(defaults::SUGGEST_DEBOUNCE_MS),
        }
    }
}

impl SessionConfig {
    /// Create a configuration for explicit local and cloud bases.
    pub fn new(local_url: impl Into<String>, cloud_url: impl Into<String>) -> Self {
        Self::default()
            .with_local_url(local_url)
            .with_cloud_url(cloud_url)
    }

    /// Load from environment variables. Unset variables keep their defaults;
    /// set but unparsable ones are an error.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var(ENV_LOCAL_URL) {
            config = config.with_local_url(url);
        }
        if let Ok(url) = env::var(ENV_CLOUD_URL) {
            config = config.with_cloud_url(url);
        }
        if let Ok(mode) = env::var(ENV_SERVER_MODE) {
            config.default_mode = mode.parse().map_err(|_| ConfigError::InvalidVar {
                var: ENV_SERVER_MODE,
                message: format!("expected auto, local or cloud, got '{}'", mode),
            })?;
        }
        if let Some(secs) = parse_u64_var(ENV_PROBE_TIMEOUT_SECS)? {
            config.probe_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_u64_var(ENV_REQUEST_TIMEOUT_SECS)? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_u64_var(ENV_SUGGEST_DEBOUNCE_MS)? {
            config.suggest_debounce = Duration::from_millis(ms);
        }

        debug!(
            local_url = %config.local_url,
            cloud_url = %config.cloud_url,
            mode = %config.default_mode,
            "Loaded session configuration from environment"
        );
        Ok(config)
    }

    pub fn with_local_url(mut self, url: impl Into<String>) -> Self {
        self.local_url = normalize_base(url.into());
        self
    }

    pub fn with_cloud_url(mut self, url: impl Into<String>) -> Self {
        self.cloud_url = normalize_base(url.into());
        self
    }

    pub fn with_default_mode(mut self, mode: ServerMode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_suggest_debounce(mut self, debounce: Duration) -> Self {
        self.suggest_debounce = debounce;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_base("local_url", &self.local_url)?;
        validate_base("cloud_url", &self.cloud_url)?;

        if self.local_url == self.cloud_url {
            return Err(ConfigError::Validation(format!(
                "local_url and cloud_url must differ, both are {}",
                self.local_url
            )));
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "probe_timeout must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn normalize_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn validate_base(name: &str, url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{} must start with http:// or https://, got: {}",
            name, url
        )));
    }
    Ok(())
}

fn parse_u64_var(var: &'static str) -> ConfigResult<Option<u64>> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidVar {
                var,
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
