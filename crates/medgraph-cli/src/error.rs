//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gateway error
    #[error("Gateway error: {0}")]
    Gateway(#[from] medgraph_llm::GatewayError),

    /// Extractor setup error
    #[error("Extractor error: {0}")]
    Extractor(#[from] medgraph_extractor::ExtractorError),

    /// Patient store error
    #[error("Storage error: {0}")]
    Store(#[from] medgraph_store::StoreError),

    /// Object store error
    #[error("Object storage error: {0}")]
    Objects(#[from] medgraph_store::ObjectStoreError),

    /// Session error
    #[error("{0}")]
    Session(#[from] medgraph_session::SessionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Patient does not exist
    #[error("Patient not found: {0}")]
    PatientNotFound(String),
}
