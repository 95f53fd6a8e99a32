//! Uploaded file records

use crate::PatientId;
use std::fmt;

/// Identifier for an uploaded file, based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u128);

impl FileId {
    /// Generate a new UUIDv7-based FileId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a FileId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a FileId from its UUID string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid file id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Processing state of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    /// Waiting to be processed
    Pending,

    /// Extraction in flight
    Processing,

    /// Fragment merged into the graph
    Completed,

    /// Extraction rejected the file (non-medical, rate limit, quota)
    Rejected,

    /// Extraction or persistence failed
    Failed,

    /// Removed by the user before its result was applied
    Cancelled,
}

impl FileStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Processing => "processing",
            FileStatus::Completed => "completed",
            FileStatus::Rejected => "rejected",
            FileStatus::Failed => "failed",
            FileStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(FileStatus::Pending),
            "processing" => Some(FileStatus::Processing),
            "completed" => Some(FileStatus::Completed),
            "rejected" => Some(FileStatus::Rejected),
            "failed" => Some(FileStatus::Failed),
            "cancelled" => Some(FileStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether processing has finished for this file
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FileStatus::Pending | FileStatus::Processing)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata row for an uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// File identifier
    pub id: FileId,

    /// Owning patient
    pub patient_pid: PatientId,

    /// Original file name
    pub file_name: String,

    /// MIME type reported at upload
    pub mime_type: String,

    /// Path in object storage
    pub storage_path: String,

    /// Size of the raw bytes
    pub size_bytes: u64,

    /// Processing state
    pub status: FileStatus,

    /// Upload timestamp (seconds since Unix epoch)
    pub uploaded_at: u64,
}

/// Raw bytes of an uploaded file, as handed to extraction and storage
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Original file name
    pub file_name: String,

    /// MIME type reported at upload
    pub mime_type: String,

    /// File contents
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Create a source file
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size of the contents in bytes
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
