//! Command implementations.

pub mod analyze;
pub mod config;
pub mod graph;
pub mod patient;
pub mod upload;

pub use self::analyze::execute_analyze;
pub use self::config::execute_config;
pub use self::graph::execute_graph;
pub use self::patient::execute_patient;
pub use self::upload::execute_upload;

use crate::config::Config;
use crate::error::{CliError, Result};
use medgraph_domain::traits::PatientStore;
use medgraph_domain::PatientId;
use medgraph_extractor::ExtractionAdapter;
use medgraph_gatekeeper::IntakeGate;
use medgraph_llm::HttpGateway;
use medgraph_session::PatientSession;
use medgraph_store::{LocalObjectStore, SqliteStore};
use std::fs;

/// Session type used by every command.
pub type CliSession = PatientSession<HttpGateway, SqliteStore, LocalObjectStore>;

/// Parse a PID argument.
pub fn parse_pid(pid: &str) -> Result<PatientId> {
    PatientId::parse(pid).map_err(CliError::InvalidInput)
}

/// Open the patient database, creating its directory if needed.
pub fn open_store(config: &Config) -> Result<SqliteStore> {
    if let Some(parent) = config.storage.database_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(SqliteStore::new(&config.storage.database_path)?)
}

/// Open the upload directory.
pub fn open_objects(config: &Config) -> Result<LocalObjectStore> {
    Ok(LocalObjectStore::new(&config.storage.objects_dir)?)
}

/// Build the extraction adapter from configuration.
pub fn build_adapter(config: &Config) -> Result<ExtractionAdapter<HttpGateway>> {
    let gateway = HttpGateway::new(config.gateway.clone())?;
    let gate = IntakeGate::new(config.intake.clone())
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(ExtractionAdapter::new(gateway, gate, config.extractor.clone())?)
}

/// Open a session for a patient.
pub fn open_session(config: &Config, pid: &PatientId) -> Result<CliSession> {
    let store = open_store(config)?;
    if store.get_patient(pid)?.is_none() {
        return Err(CliError::PatientNotFound(pid.to_string()));
    }
    let session = PatientSession::open(build_adapter(config)?, store, open_objects(config)?, pid)?;
    Ok(session)
}
