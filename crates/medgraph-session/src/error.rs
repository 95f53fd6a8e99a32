//! Error types for session operations

use medgraph_llm::GatewayError;
use thiserror::Error;

/// Errors that can occur while driving a patient session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Patient store error
    #[error("Storage error: {0}")]
    Store(String),

    /// Raw upload or file metadata could not be written
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Patient, file or node does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Analysis call failed
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A previous batch exhausted the account quota
    #[error("Extraction is disabled for this session: account quota exhausted")]
    ExtractionDisabled,
}
