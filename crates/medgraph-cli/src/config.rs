//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use medgraph_extractor::ExtractorConfig;
use medgraph_gatekeeper::IntakeConfig;
use medgraph_llm::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gateway connection
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Where patients, graphs and uploads are kept
    #[serde(default)]
    pub storage: StorageConfig,

    /// Extraction timeout and concurrency
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Local intake checks
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Storage locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Root directory for raw uploads
    pub objects_dir: PathBuf,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// The `~/.medgraph` directory, or `.medgraph` when there is no home directory.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".medgraph"))
        .unwrap_or_else(|| PathBuf::from(".medgraph"))
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> PathBuf {
        data_dir().join("config.toml")
    }

    /// Load configuration from the default path, or defaults if there is no file.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// Load configuration from a file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.gateway
            .validate()
            .map_err(|e| CliError::Config(format!("[gateway] {}", e)))?;
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("[extractor] {}", e)))?;
        self.intake
            .validate()
            .map_err(|e| CliError::Config(format!("[intake] {}", e)))?;
        Ok(())
    }

    /// Apply command-line and environment overrides.
    pub fn apply_overrides(&mut self, gateway_url: Option<String>, api_key: Option<String>) {
        if let Some(url) = gateway_url {
            self.gateway.base_url = url;
        }
        if let Some(key) = api_key {
            self.gateway.api_key = Some(key);
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = data_dir();
        Self {
            database_path: dir.join("medgraph.db"),
            objects_dir: dir.join("uploads"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
