//! Persisted knowledge-graph record

use crate::{GraphEdge, GraphNode, KnowledgeGraph, PatientId};
use serde::{Deserialize, Serialize};

/// Version of the node/edge payload shape stored with every graph record
///
/// Version 1: nodes carry `id, label, type, x, y, connections, data` with
/// primitive-only `data` values; edges carry `source, target, label, strength`.
pub const GRAPH_SCHEMA_VERSION: u32 = 1;

/// A diagnostic classification code with its description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Icd10Code {
    /// Code, e.g. `E11.9`
    pub code: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

impl Icd10Code {
    /// Create a code entry
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// One persisted graph per patient, upserted by PID
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRecord {
    /// Owning patient
    pub patient_pid: PatientId,

    /// Laid-out nodes
    pub nodes: Vec<GraphNode>,

    /// Edges
    pub edges: Vec<GraphEdge>,

    /// Codes from the latest graph analysis
    pub icd10_codes: Vec<Icd10Code>,

    /// Free-text analysis from the latest graph analysis
    pub graph_analysis: Option<String>,

    /// Payload shape version
    pub schema_version: u32,

    /// Last write timestamp (seconds since Unix epoch)
    pub updated_at: u64,
}

impl GraphRecord {
    /// Create an empty record for a patient
    pub fn empty(patient_pid: PatientId, updated_at: u64) -> Self {
        Self {
            patient_pid,
            nodes: Vec::new(),
            edges: Vec::new(),
            icd10_codes: Vec::new(),
            graph_analysis: None,
            schema_version: GRAPH_SCHEMA_VERSION,
            updated_at,
        }
    }

    /// The stored graph
    pub fn graph(&self) -> KnowledgeGraph {
        KnowledgeGraph::from_parts(self.nodes.clone(), self.edges.clone())
    }

    /// Replace the stored graph
    pub fn set_graph(&mut self, graph: &KnowledgeGraph) {
        self.nodes = graph.nodes.clone();
        self.edges = graph.edges.clone();
    }
}
