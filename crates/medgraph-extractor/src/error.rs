//! Error types for the Extractor

use medgraph_gatekeeper::GatekeeperError;
use thiserror::Error;

/// Errors that can occur while building an extraction adapter
///
/// Extraction itself never fails; problems with a file are reported as a
/// rejected outcome.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Intake gate could not be built
    #[error("Gatekeeper error: {0}")]
    Gatekeeper(#[from] GatekeeperError),
}
