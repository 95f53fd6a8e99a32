//! Local filesystem object storage for raw uploads

use medgraph_domain::traits::ObjectStore;
use medgraph_domain::{FileId, PatientId};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during object storage operations
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path is empty, absolute, or escapes the store root
    #[error("Invalid object path: {0}")]
    InvalidPath(String),
}

/// Replace anything but ASCII letters, digits, `.`, `-` and `_` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized.to_string()
    }
}

/// Object path for an uploaded file: `<pid>/<file-id>-<sanitized name>`
pub fn storage_path(pid: &PatientId, file_id: FileId, file_name: &str) -> String {
    format!("{}/{}-{}", pid, file_id, sanitize_file_name(file_name))
}

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, ObjectStoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative object path inside the root
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(path);
        if path.trim().is_empty() {
            return Err(ObjectStoreError::InvalidPath(path.to_string()));
        }

        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir
                | Component::ParentDir
                | Component::RootDir
                | Component::Prefix(_) => {
                    return Err(ObjectStoreError::InvalidPath(path.to_string()));
                }
            }
        }
        Ok(resolved)
    }

    /// Read an object's bytes
    pub fn get(&self, path: &str) -> Result<Vec<u8>, ObjectStoreError> {
        Ok(fs::read(self.resolve(path)?)?)
    }
}

impl ObjectStore for LocalObjectStore {
    type Error = ObjectStoreError;

    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), Self::Error> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        debug!(path, bytes = bytes.len(), "Stored object");
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<bool, Self::Error> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, path: &str) -> Result<bool, Self::Error> {
        Ok(self.resolve(path)?.is_file())
    }
}
