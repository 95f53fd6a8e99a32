//! Fragment and accumulated graph containers

use crate::{GraphEdge, GraphNode, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// The node/edge graph extracted from a single uploaded file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Extracted entities
    #[serde(default)]
    pub nodes: Vec<GraphNode>,

    /// Extracted relationships
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl Fragment {
    /// Create a fragment from nodes and edges
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Whether the fragment carries no nodes and no edges
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// The deduplicated union of every fragment processed for one patient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    /// Nodes in admission order
    #[serde(default)]
    pub nodes: Vec<GraphNode>,

    /// Edges in admission order
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph from nodes and edges as-is (no dedup, no layout)
    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges (including dangling ones)
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look up a node by label, ignoring case
    pub fn node_by_label(&self, label: &str) -> Option<&GraphNode> {
        let key = label.to_lowercase();
        self.nodes.iter().find(|n| n.label_key() == key)
    }

    /// Nodes of the given type, in graph order
    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    /// Count nodes per type
    pub fn type_counts(&self) -> HashMap<NodeType, usize> {
        let mut counts = HashMap::new();
        for node in &self.nodes {
            *counts.entry(node.node_type).or_insert(0) += 1;
        }
        counts
    }

    /// Edges whose endpoints both resolve to nodes in this graph
    ///
    /// This is the render set handed to presentation; dangling edges are
    /// dropped silently.
    pub fn resolved_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(move |e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
    }

    /// Edges touching the given node that resolve on both ends
    pub fn edges_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.resolved_edges().filter(move |e| e.touches(node_id))
    }

    /// Recompute every node's `connections` from the resolved edge set
    pub fn refresh_connections(&mut self) {
        let mut neighbors: HashMap<String, BTreeSet<String>> = HashMap::new();
        for edge in self.resolved_edges() {
            if edge.source == edge.target {
                continue;
            }
            neighbors
                .entry(edge.source.clone())
                .or_default()
                .insert(edge.target.clone());
            neighbors
                .entry(edge.target.clone())
                .or_default()
                .insert(edge.source.clone());
        }

        for node in &mut self.nodes {
            node.connections = neighbors.remove(&node.id).unwrap_or_default();
        }
    }
}
