//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur while setting up the gate
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
