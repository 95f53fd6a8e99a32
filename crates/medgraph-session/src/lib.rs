//! MedGraph Session
//!
//! Drives one patient's graph: queues uploads, runs extraction with bounded
//! concurrency, folds fragments into the graph in upload order, and writes
//! everything through to storage.
//!
//! # Processing model
//!
//! ```text
//! enqueue → [pending queue] → store upload → extract (≤ N in flight)
//!                                                 ↓
//!                      save graph ← layout ← merge (upload order)
//! ```
//!
//! Cancelling a pending file removes it from the queue. The queue is checked
//! before a file is dispatched and again before its result is merged, so a
//! cancelled file never reaches the graph.

#![warn(missing_docs)]

mod error;
mod icd10;
mod pending;
mod report;
mod session;

pub use error::SessionError;
pub use icd10::{codes_for, scan_codes};
pub use pending::{CancelHandle, PendingFile, PendingQueue};
pub use report::{BatchReport, PersistenceFailure};
pub use session::{delete_patient, PatientSession, RenderSet};
