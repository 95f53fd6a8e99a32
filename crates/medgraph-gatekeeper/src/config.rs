//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Default upload size limit (20 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;

/// Configuration for intake rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Largest accepted file, in bytes
    pub max_file_bytes: u64,

    /// Enable MIME type allowlisting
    pub check_mime_type: bool,

    /// Accepted MIME types; `type/*` matches any subtype
    pub allowed_mime_types: Vec<String>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            check_mime_type: true,
            allowed_mime_types: vec![
                "application/pdf".to_string(),
                "application/json".to_string(),
                "application/msword".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
                "text/*".to_string(),
                "image/*".to_string(),
            ],
        }
    }
}

impl IntakeConfig {
    /// Create a permissive configuration (size checks only)
    pub fn permissive() -> Self {
        Self {
            max_file_bytes: 100 * 1024 * 1024,
            check_mime_type: false,
            ..Self::default()
        }
    }

    /// Create a strict configuration (documents only, smaller limit)
    pub fn strict() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            check_mime_type: true,
            allowed_mime_types: vec!["application/pdf".to_string(), "text/plain".to_string()],
        }
    }

    /// Whether `mime_type` is on the allowlist
    pub fn allows(&self, mime_type: &str) -> bool {
        let mime = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        self.allowed_mime_types.iter().any(|pattern| {
            let pattern = pattern.to_ascii_lowercase();
            match pattern.strip_suffix("/*") {
                Some(major) => mime
                    .split_once('/')
                    .is_some_and(|(m, sub)| m == major && !sub.is_empty()),
                None => mime == pattern,
            }
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_bytes == 0 {
            return Err("max_file_bytes must be greater than 0".to_string());
        }
        if self.check_mime_type && self.allowed_mime_types.is_empty() {
            return Err("allowed_mime_types must not be empty when check_mime_type is on".to_string());
        }
        if let Some(bad) = self.allowed_mime_types.iter().find(|m| !m.contains('/')) {
            return Err(format!("'{}' is not a MIME type pattern", bad));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
