//! Pending upload queue shared with cancel handles

use medgraph_domain::{FileId, SourceFile};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// A file waiting to be extracted and merged
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFile {
    /// Identifier assigned at enqueue time
    pub id: FileId,

    /// Raw upload
    pub file: SourceFile,

    /// Upload timestamp (seconds since Unix epoch)
    pub uploaded_at: u64,
}

#[derive(Debug, Default)]
struct PendingState {
    files: Vec<PendingFile>,
    cancelled: HashSet<FileId>,
}

/// Upload-ordered set of files not yet merged
///
/// A file leaves the queue when its result is applied or when it is
/// cancelled. Processing checks membership before dispatching a file and
/// again before merging its result, so a cancelled file is never merged.
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    inner: Arc<Mutex<PendingState>>,
}

impl PendingQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PendingState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append a file and return its identifier
    pub fn push(&self, file: SourceFile, uploaded_at: u64) -> FileId {
        let id = FileId::new();
        self.lock().files.push(PendingFile {
            id,
            file,
            uploaded_at,
        });
        id
    }

    /// Copy of the queued files in upload order
    pub fn snapshot(&self) -> Vec<PendingFile> {
        self.lock().files.clone()
    }

    /// Whether a file is still queued
    pub fn contains(&self, id: FileId) -> bool {
        self.lock().files.iter().any(|f| f.id == id)
    }

    /// Remove a file whose result is being applied
    pub fn take(&self, id: FileId) -> Option<PendingFile> {
        let mut state = self.lock();
        let index = state.files.iter().position(|f| f.id == id)?;
        Some(state.files.remove(index))
    }

    /// Remove a file and remember that it was cancelled
    ///
    /// Returns `false` if the file was not queued (already applied, already
    /// cancelled, or unknown).
    pub fn cancel(&self, id: FileId) -> bool {
        let mut state = self.lock();
        match state.files.iter().position(|f| f.id == id) {
            Some(index) => {
                state.files.remove(index);
                state.cancelled.insert(id);
                true
            }
            None => false,
        }
    }

    /// Whether a file was cancelled and not yet drained
    pub fn was_cancelled(&self, id: FileId) -> bool {
        self.lock().cancelled.contains(&id)
    }

    /// Take the ids cancelled since the last drain
    ///
    /// The owner records them elsewhere; the queue then forgets them.
    pub fn drain_cancelled(&self) -> Vec<FileId> {
        self.lock().cancelled.drain().collect()
    }

    /// Number of queued files
    pub fn len(&self) -> usize {
        self.lock().files.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.lock().files.is_empty()
    }

    /// A handle that can only cancel
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            queue: self.clone(),
        }
    }
}

/// Cancels pending files from outside the session
///
/// Usable while the session is processing a batch.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    queue: PendingQueue,
}

impl CancelHandle {
    /// Cancel a pending file; see [`PendingQueue::cancel`]
    pub fn cancel(&self, id: FileId) -> bool {
        self.queue.cancel(id)
    }
}
