//! MedGraph Storage Layer
//!
//! Implements the `PatientStore` trait using SQLite and the `ObjectStore`
//! trait using the local filesystem.
//!
//! # Architecture
//!
//! - SQLite for patients, file metadata and one graph row per patient
//! - Deleting a patient cascades to its files and graph (`ON DELETE CASCADE`)
//! - Node, edge and ICD-10 payloads are stored as JSON text
//! - Raw uploads live under `<root>/<pid>/<file-id>-<name>`
//!
//! # Examples
//!
//! ```no_run
//! use medgraph_store::{now_secs, SqliteStore};
//!
//! let mut store = SqliteStore::new(":memory:").unwrap();
//! let patient = store.register_patient("Ana Lima", 34, now_secs()).unwrap();
//! println!("Registered {}", patient.pid);
//! ```

#![warn(missing_docs)]

mod object;

use medgraph_domain::traits::PatientStore;
use medgraph_domain::{
    FileId, FileRecord, FileStatus, GraphRecord, Patient, PatientId, PatientKey,
};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub use object::{sanitize_file_name, storage_path, LocalObjectStore, ObjectStoreError};

/// How many random suffixes to try before giving up on a new PID
pub const MAX_PID_ATTEMPTS: usize = 32;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Every PID candidate was already taken
    #[error("No free PID for '{0}' after {max} attempts", max = MAX_PID_ATTEMPTS)]
    PidExhausted(String),
}

/// Current time in seconds since the Unix epoch
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// SQLite-based implementation of PatientStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Create a patient with a freshly generated, unused PID
    pub fn register_patient(
        &mut self,
        name: &str,
        age: u32,
        created_at: u64,
    ) -> Result<Patient, StoreError> {
        let mut rng = rand::thread_rng();
        self.register_patient_with(name, age, created_at, || rng.gen_range(0..10_000))
    }

    /// Create a patient, drawing PID suffixes from `next_suffix`
    ///
    /// Candidates already in use are skipped; gives up after
    /// [`MAX_PID_ATTEMPTS`] collisions.
    pub fn register_patient_with<F>(
        &mut self,
        name: &str,
        age: u32,
        created_at: u64,
        mut next_suffix: F,
    ) -> Result<Patient, StoreError>
    where
        F: FnMut() -> u32,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidData("Patient name is empty".to_string()));
        }

        for _ in 0..MAX_PID_ATTEMPTS {
            let pid = PatientId::derive(name, age, next_suffix());
            if self.get_patient(&pid)?.is_some() {
                debug!(%pid, "PID collision, retrying");
                continue;
            }

            let patient = Patient::new(pid, name, age, created_at);
            self.create_patient(patient.clone())?;
            info!(pid = %patient.pid, "Registered patient");
            return Ok(patient);
        }

        Err(StoreError::PidExhausted(name.to_string()))
    }

    /// Convert a u128 identifier to bytes for storage
    fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    /// Convert stored bytes back to a u128 identifier
    fn bytes_to_id(bytes: &[u8]) -> Result<u128, StoreError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            StoreError::InvalidData(format!("Expected 16 bytes for id, got {}", bytes.len()))
        })?;
        Ok(u128::from_be_bytes(arr))
    }

    fn conversion_error(
        column: usize,
        kind: rusqlite::types::Type,
        e: StoreError,
    ) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(column, kind, Box::new(e))
    }

    fn row_to_patient(row: &rusqlite::Row<'_>) -> rusqlite::Result<Patient> {
        let key_bytes: Vec<u8> = row.get(0)?;
        let key = Self::bytes_to_id(&key_bytes)
            .map_err(|e| Self::conversion_error(0, rusqlite::types::Type::Blob, e))?;

        let pid_str: String = row.get(1)?;
        let pid = PatientId::parse(&pid_str).map_err(|e| {
            Self::conversion_error(1, rusqlite::types::Type::Text, StoreError::InvalidData(e))
        })?;

        Ok(Patient {
            key: PatientKey::from_value(key),
            pid,
            name: row.get(2)?,
            age: row.get(3)?,
            created_at: row.get::<_, i64>(4)? as u64,
        })
    }

    fn row_to_file(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_id(&id_bytes)
            .map_err(|e| Self::conversion_error(0, rusqlite::types::Type::Blob, e))?;

        let pid_str: String = row.get(1)?;
        let patient_pid = PatientId::parse(&pid_str).map_err(|e| {
            Self::conversion_error(1, rusqlite::types::Type::Text, StoreError::InvalidData(e))
        })?;

        let status_str: String = row.get(6)?;
        let status = FileStatus::parse(&status_str).ok_or_else(|| {
            Self::conversion_error(
                6,
                rusqlite::types::Type::Text,
                StoreError::InvalidData(format!("Unknown file status: {}", status_str)),
            )
        })?;

        Ok(FileRecord {
            id: FileId::from_value(id),
            patient_pid,
            file_name: row.get(2)?,
            mime_type: row.get(3)?,
            storage_path: row.get(4)?,
            size_bytes: row.get::<_, i64>(5)? as u64,
            status,
            uploaded_at: row.get::<_, i64>(7)? as u64,
        })
    }
}

/// Decode a stored JSON column, treating an unreadable payload as empty
fn decode_or_empty<T: DeserializeOwned + Default>(pid: &PatientId, column: &str, text: &str) -> T {
    serde_json::from_str(text).unwrap_or_else(|e| {
        warn!(patient = %pid, column, error = %e, "Stored graph payload unreadable; using empty");
        T::default()
    })
}

impl PatientStore for SqliteStore {
    type Error = StoreError;

    fn create_patient(&mut self, patient: Patient) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO patients (id, pid, name, age, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Self::id_to_bytes(patient.key.value()),
                patient.pid.as_str(),
                &patient.name,
                patient.age,
                patient.created_at as i64,
            ],
        )?;
        Ok(())
    }

    fn get_patient(&self, pid: &PatientId) -> Result<Option<Patient>, Self::Error> {
        let patient = self
            .conn
            .query_row(
                "SELECT id, pid, name, age, created_at FROM patients WHERE pid = ?1",
                params![pid.as_str()],
                Self::row_to_patient,
            )
            .optional()?;
        Ok(patient)
    }

    fn list_patients(&self) -> Result<Vec<Patient>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, pid, name, age, created_at FROM patients
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let patients = stmt
            .query_map([], Self::row_to_patient)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(patients)
    }

    fn delete_patient(&mut self, pid: &PatientId) -> Result<bool, Self::Error> {
        let deleted = self
            .conn
            .execute("DELETE FROM patients WHERE pid = ?1", params![pid.as_str()])?;
        Ok(deleted > 0)
    }

    fn record_file(&mut self, file: FileRecord) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO patient_files
             (id, patient_pid, file_name, mime_type, storage_path, size_bytes, status, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Self::id_to_bytes(file.id.value()),
                file.patient_pid.as_str(),
                &file.file_name,
                &file.mime_type,
                &file.storage_path,
                file.size_bytes as i64,
                file.status.as_str(),
                file.uploaded_at as i64,
            ],
        )?;
        Ok(())
    }

    fn update_file_status(&mut self, id: FileId, status: FileStatus) -> Result<(), Self::Error> {
        let updated = self.conn.execute(
            "UPDATE patient_files SET status = ?1 WHERE id = ?2",
            params![status.as_str(), Self::id_to_bytes(id.value())],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("file {}", id)));
        }
        Ok(())
    }

    fn list_files(&self, pid: &PatientId) -> Result<Vec<FileRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, patient_pid, file_name, mime_type, storage_path, size_bytes, status, uploaded_at
             FROM patient_files WHERE patient_pid = ?1
             ORDER BY uploaded_at, rowid",
        )?;
        let files = stmt
            .query_map(params![pid.as_str()], Self::row_to_file)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    fn delete_file(&mut self, id: FileId) -> Result<bool, Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM patient_files WHERE id = ?1",
            params![Self::id_to_bytes(id.value())],
        )?;
        Ok(deleted > 0)
    }

    fn load_graph(&self, pid: &PatientId) -> Result<Option<GraphRecord>, Self::Error> {
        let row = self
            .conn
            .query_row(
                "SELECT nodes, edges, icd10_codes, graph_analysis, schema_version, updated_at
                 FROM knowledge_graphs WHERE patient_pid = ?1",
                params![pid.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((nodes, edges, codes, graph_analysis, schema_version, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(GraphRecord {
            patient_pid: pid.clone(),
            nodes: decode_or_empty(pid, "nodes", &nodes),
            edges: decode_or_empty(pid, "edges", &edges),
            icd10_codes: decode_or_empty(pid, "icd10_codes", &codes),
            graph_analysis,
            schema_version,
            updated_at: updated_at as u64,
        }))
    }

    fn save_graph(&mut self, record: &GraphRecord) -> Result<(), Self::Error> {
        let nodes = serde_json::to_string(&record.nodes)?;
        let edges = serde_json::to_string(&record.edges)?;
        let codes = serde_json::to_string(&record.icd10_codes)?;

        self.conn.execute(
            "INSERT INTO knowledge_graphs
             (patient_pid, nodes, edges, icd10_codes, graph_analysis, schema_version, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(patient_pid) DO UPDATE SET
             nodes = excluded.nodes, edges = excluded.edges, icd10_codes = excluded.icd10_codes,
             graph_analysis = excluded.graph_analysis, schema_version = excluded.schema_version,
             updated_at = excluded.updated_at",
            params![
                record.patient_pid.as_str(),
                nodes,
                edges,
                codes,
                &record.graph_analysis,
                record.schema_version,
                record.updated_at as i64,
            ],
        )?;

        debug!(
            pid = %record.patient_pid,
            nodes = record.nodes.len(),
            edges = record.edges.len(),
            "Saved graph"
        );
        Ok(())
    }
}
