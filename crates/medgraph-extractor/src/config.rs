//! Extraction call settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How extraction calls are bounded.
///
/// The gateway's own HTTP timeout still applies; `extraction_timeout_secs`
/// caps the whole call including multipart upload and body decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub extraction_timeout_secs: u64,

    /// Calls in flight at once while a batch is processed.
    pub max_concurrent_extractions: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_secs: 120,
            max_concurrent_extractions: 3,
        }
    }
}

impl ExtractorConfig {
    /// For a fast local gateway: more calls in flight, shorter patience.
    pub fn aggressive() -> Self {
        Self {
            extraction_timeout_secs: 60,
            max_concurrent_extractions: 6,
        }
    }

    /// For slow or rate-limited gateways: one call at a time.
    pub fn lenient() -> Self {
        Self {
            extraction_timeout_secs: 300,
            max_concurrent_extractions: 1,
        }
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Reject settings that would stall a batch.
    pub fn validate(&self) -> Result<(), String> {
        if self.extraction_timeout_secs == 0 {
            return Err("extraction timeout must be at least one second".to_string());
        }
        if self.max_concurrent_extractions == 0 {
            return Err("at least one extraction must be allowed in flight".to_string());
        }
        Ok(())
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Invalid extractor config: {}", e))
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Cannot write extractor config: {}", e))
    }
}
