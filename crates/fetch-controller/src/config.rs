//! # Configuration
//!
//! Settings for the HTTP data source and the controller actor.
//!
//! Both structs have working defaults. `from_env()` reads overrides from the
//! process environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DASHBOARD_API_BASE_URL` | [`SourceConfig::base_url`] |
//! | `DASHBOARD_USER_AGENT` | [`SourceConfig::user_agent`] |
//! | `DASHBOARD_CHANNEL_BUFFER` | [`ControllerConfig::buffer_size`] |
//!
//! `from_lookup()` takes the same keys from any function, which keeps tests
//! away from the real environment.

use std::collections::BTreeMap;
use url::Url;

pub const ENV_BASE_URL: &str = "DASHBOARD_API_BASE_URL";
pub const ENV_USER_AGENT: &str = "DASHBOARD_USER_AGENT";
pub const ENV_CHANNEL_BUFFER: &str = "DASHBOARD_CHANNEL_BUFFER";

pub const DEFAULT_USER_AGENT: &str = concat!("fetch-controller/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_CHANNEL_BUFFER: usize = 32;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid base URL {value:?}: {reason}")]
    InvalidBaseUrl { value: String, reason: String },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidNumber { var: String, value: String },
}

/// Settings for [`HttpSource`](crate::HttpSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Relative resources are joined onto this URL.
    pub base_url: Option<String>,
    pub user_agent: String,
    /// Sent with every request; descriptor headers win on conflict.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: BTreeMap::from([(
                "accept".to_string(),
                "application/json".to_string(),
            )]),
        }
    }
}

impl SourceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(base_url)?;
        }
        if let Some(user_agent) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            config.user_agent = user_agent;
        }
        Ok(config)
    }

    /// Sets the base URL after checking it parses as an absolute URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let value = base_url.into();
        Url::parse(&value).map_err(|e| ConfigError::InvalidBaseUrl {
            value: value.clone(),
            reason: e.to_string(),
        })?;
        self.base_url = Some(value);
        Ok(self)
    }
}

/// Settings for [`FetchController`](crate::FetchController).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Capacity of the command channel. Callers wait when it is full.
    pub buffer_size: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_CHANNEL_BUFFER) {
            config.buffer_size = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidNumber {
                    var: ENV_CHANNEL_BUFFER.to_string(),
                    value,
                })?;
        }
        Ok(config)
    }
}
