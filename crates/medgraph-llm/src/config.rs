//! Configuration for the gateway client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default gateway base URL (local functions runtime)
pub const DEFAULT_BASE_URL: &str = "http://localhost:54321/functions/v1";

/// Default HTTP timeout for gateway requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the LLM gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL the endpoint paths are appended to
    pub base_url: String,

    /// Bearer key sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GatewayConfig {
    /// Create a configuration for a base URL with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Short timeout for interactive use
    pub fn aggressive() -> Self {
        Self {
            timeout_secs: 20,
            ..Self::default()
        }
    }

    /// Long timeout for large scanned documents
    pub fn lenient() -> Self {
        Self {
            timeout_secs: 180,
            ..Self::default()
        }
    }

    /// Set the bearer key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Get the timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL for an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("base_url '{}' must be an http(s) URL", self.base_url));
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if matches!(&self.api_key, Some(k) if k.trim().is_empty()) {
            return Err("api_key must not be blank".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(GatewayConfig::aggressive().validate().is_ok());
        assert!(GatewayConfig::lenient().validate().is_ok());
        assert!(GatewayConfig::aggressive().timeout() < GatewayConfig::lenient().timeout());
    }

    #[test]
    fn test_endpoint_joins_slashes() {
        let config = GatewayConfig::new("https://example.test/functions/v1/");
        assert_eq!(
            config.endpoint("/extract-knowledge"),
            "https://example.test/functions/v1/extract-knowledge"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(GatewayConfig::new("ftp://nope").validate().is_err());
    }

    #[test]
    fn test_blank_api_key_rejected() {
        let config = GatewayConfig::default().with_api_key("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let config = GatewayConfig::from_toml(r#"base_url = "https://gw.test""#).unwrap();
        assert_eq!(config.base_url, "https://gw.test");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.api_key.is_none());
    }
}
