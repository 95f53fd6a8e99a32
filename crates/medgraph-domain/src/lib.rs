//! MedGraph Domain Layer
//!
//! This crate contains the core graph logic and data model for MedGraph.
//! It performs no I/O and defines the fundamental concepts, value objects,
//! and trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Fragment**: The node/edge graph extracted from a single uploaded file
//! - **Knowledge graph**: The deduplicated union of all fragments for one patient
//! - **Accumulator**: Merges fragments with case-insensitive, first-seen-wins dedup
//! - **Layout**: Deterministic condition-centered radial placement
//! - **PID**: Short patient identifier derived from name, age and a suffix
//!
//! ## Architecture
//!
//! - Pure logic only (merge and layout never fail on well-formed input)
//! - Infrastructure implementations live in other crates
//! - Trait definitions for persistence and object storage

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod edge;
pub mod file;
pub mod graph;
pub mod layout;
pub mod node;
pub mod patient;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use accumulator::{merge, merge_all, MergeStats};
pub use edge::GraphEdge;
pub use file::{FileId, FileRecord, FileStatus, SourceFile};
pub use graph::{Fragment, KnowledgeGraph};
pub use layout::LayoutConfig;
pub use node::{AttributeMap, AttributeValue, GraphNode, NodeType};
pub use patient::{Patient, PatientId, PatientKey};
pub use record::{GraphRecord, Icd10Code, GRAPH_SCHEMA_VERSION};
