//! Adapter configuration
//!
//! Values come from an optional TOML file and are then overridden by
//! command-line flags or environment variables in the binary.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gateway::RetryPolicy;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8001";
pub const DEFAULT_ADAPTER_URL: &str = "http://localhost:3002";

/// Environment variable that turns on curl echoing of gateway calls
pub const DEBUG_CURL_ENV: &str = "GATEWAY_DEBUG_CURL";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterConfig {
    /// Base URL of the gateway admin API
    pub gateway_url: String,
    /// Externally visible base URL of this adapter
    pub adapter_url: String,
    /// Per-attempt request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Fixed delay between transport retries in milliseconds
    pub retry_delay_ms: u64,
    /// Highest attempt index before a transport failure is surfaced
    pub max_retries: u32,
    /// `size` parameter used when listing collections
    pub page_size: u32,
    /// Echo every gateway call as a curl command
    pub debug_curl: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            adapter_url: DEFAULT_ADAPTER_URL.to_string(),
            request_timeout_ms: 5000,
            retry_delay_ms: 2000,
            max_retries: 10,
            page_size: 1000,
            debug_curl: false,
        }
    }
}

impl AdapterConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: AdapterConfig =
            toml::from_str(raw).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the executor cannot work with
    pub fn validate(&self) -> Result<()> {
        for (key, url) in [("gatewayUrl", &self.gateway_url), ("adapterUrl", &self.adapter_url)] {
            reqwest::Url::parse(url)
                .map_err(|e| Error::ConfigError(format!("{key} '{url}' is not a URL: {e}")))?;
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::ConfigError(
                "requestTimeoutMs must be greater than zero".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(Error::ConfigError(
                "pageSize must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_retries: self.max_retries,
        }
    }
}

/// Interpret a debug flag value the way shell users expect
pub fn flag_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
