//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default number of concurrent lookups used by the bulk client.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default per-request timeout: 60 seconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Default interval between polling cycles: 2 seconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Settings for [`TaskClient`](super::http::TaskClient) and the helpers
/// built from it.
///
/// # Example Configuration File
///
/// ```toml
/// address = "https://tes.example.org"
/// timeout_ms = 30000
/// concurrency = 10
/// poll_interval_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address; normalized when the client is built.
    pub address: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Worker count for bulk lookups. `0` means [`DEFAULT_CONCURRENCY`].
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Interval between polling cycles in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Optional `User-Agent` header value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl ClientConfig {
    /// Create a configuration for `address` with default settings.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            concurrency: DEFAULT_CONCURRENCY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            user_agent: None,
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from environment variables.
    ///
    /// - `TES_SERVER_ADDRESS` (required)
    /// - `TES_TIMEOUT_MS`
    /// - `TES_CONCURRENCY`
    /// - `TES_POLL_INTERVAL_MS`
    ///
    /// Unset optional variables keep their defaults; set but unparsable
    /// values are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let address = lookup("TES_SERVER_ADDRESS")
            .ok_or_else(|| Error::Config("TES_SERVER_ADDRESS is not set".to_string()))?;
        let mut config = Self::new(address);

        if let Some(value) = lookup("TES_TIMEOUT_MS") {
            config.timeout_ms = parse_var("TES_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("TES_CONCURRENCY") {
            config.concurrency = parse_var("TES_CONCURRENCY", &value)?;
        }
        if let Some(value) = lookup("TES_POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_var("TES_POLL_INTERVAL_MS", &value)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check settings that cannot be defaulted away.
    ///
    /// A zero timeout would fail every request, so it is rejected rather
    /// than passed on to the HTTP client.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the bulk worker count.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Worker count with `0` replaced by [`DEFAULT_CONCURRENCY`].
    pub fn effective_concurrency(&self) -> usize {
        effective_concurrency(self.concurrency)
    }
}

/// Replace a zero worker count with [`DEFAULT_CONCURRENCY`].
pub fn effective_concurrency(requested: usize) -> usize {
    if requested == 0 {
        DEFAULT_CONCURRENCY
    } else {
        requested
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}={value:?}: {e}")))
}
