//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{FileId, FileRecord, FileStatus, GraphRecord, Patient, PatientId};

/// Trait for storing patients, their file metadata and their graphs
///
/// Implemented by the infrastructure layer (medgraph-store)
pub trait PatientStore {
    /// Error type for store operations
    type Error;

    /// Insert a new patient record
    fn create_patient(&mut self, patient: Patient) -> Result<(), Self::Error>;

    /// Get a patient by PID
    fn get_patient(&self, pid: &PatientId) -> Result<Option<Patient>, Self::Error>;

    /// List all patients, newest first
    fn list_patients(&self) -> Result<Vec<Patient>, Self::Error>;

    /// Delete a patient along with its files and graph
    ///
    /// Returns whether a patient was deleted.
    fn delete_patient(&mut self, pid: &PatientId) -> Result<bool, Self::Error>;

    /// Insert file metadata
    fn record_file(&mut self, file: FileRecord) -> Result<(), Self::Error>;

    /// Update the processing state of a file
    fn update_file_status(&mut self, id: FileId, status: FileStatus) -> Result<(), Self::Error>;

    /// List a patient's files in upload order
    fn list_files(&self, pid: &PatientId) -> Result<Vec<FileRecord>, Self::Error>;

    /// Delete file metadata; returns whether a row was deleted
    fn delete_file(&mut self, id: FileId) -> Result<bool, Self::Error>;

    /// Load a patient's graph record
    fn load_graph(&self, pid: &PatientId) -> Result<Option<GraphRecord>, Self::Error>;

    /// Insert or replace a patient's graph record
    fn save_graph(&mut self, record: &GraphRecord) -> Result<(), Self::Error>;
}

/// Trait for storing raw uploaded bytes by path
///
/// Implemented by the infrastructure layer (medgraph-store)
pub trait ObjectStore {
    /// Error type for object operations
    type Error;

    /// Write bytes at a path, replacing any existing object
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Remove the object at a path; returns whether it existed
    fn remove(&self, path: &str) -> Result<bool, Self::Error>;

    /// Whether an object exists at a path
    fn exists(&self, path: &str) -> Result<bool, Self::Error>;
}
