//! Radial layout engine
//!
//! Condition nodes sit at the center of the canvas (a single condition exactly
//! at the center, several spread on a horizontal line through it); every other
//! node is placed on a circle around the center, starting at the top and
//! proceeding clockwise. The radius grows with the number of ringed nodes.
//!
//! Layout depends only on node types and their order, so re-running it on the
//! same graph reproduces the same coordinates. Positions supplied by the
//! extraction source are always overwritten.

use crate::{GraphNode, KnowledgeGraph};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Canvas-space layout constants
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Horizontal center of the canvas
    pub center_x: f64,

    /// Vertical center of the canvas
    pub center_y: f64,

    /// Distance between adjacent condition nodes
    pub condition_spacing: f64,

    /// Smallest ring radius
    pub min_radius: f64,

    /// Ring radius before per-node growth
    pub base_radius: f64,

    /// Ring growth per ringed node
    pub radius_per_node: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            center_x: 400.0,
            center_y: 300.0,
            condition_spacing: 50.0,
            min_radius: 180.0,
            base_radius: 120.0,
            radius_per_node: 10.0,
        }
    }
}

impl LayoutConfig {
    /// The canvas center
    pub fn center(&self) -> (f64, f64) {
        (self.center_x, self.center_y)
    }

    /// Ring radius for `others` ringed nodes around `conditions` central nodes
    ///
    /// `max(min_radius, base_radius + radius_per_node * others)`, raised to
    /// clear the condition line by one spacing when it would otherwise reach
    /// the ring.
    pub fn radius(&self, others: usize, conditions: usize) -> f64 {
        let grown = self.base_radius + self.radius_per_node * others as f64;
        let radius = self.min_radius.max(grown);
        radius.max(self.condition_half_span(conditions) + self.condition_spacing)
    }

    /// Distance from the center to the outermost condition node
    fn condition_half_span(&self, conditions: usize) -> f64 {
        conditions.saturating_sub(1) as f64 / 2.0 * self.condition_spacing
    }
}

/// Compute positions for `nodes`, index-aligned with the input
pub fn positions(nodes: &[GraphNode], config: &LayoutConfig) -> Vec<(f64, f64)> {
    let (cx, cy) = config.center();
    let mut out = vec![(cx, cy); nodes.len()];

    let (conditions, others): (Vec<usize>, Vec<usize>) =
        (0..nodes.len()).partition(|&i| nodes[i].node_type.is_central());

    let n = conditions.len();
    for (slot, &idx) in conditions.iter().enumerate() {
        let offset = (slot as f64 - (n as f64 - 1.0) / 2.0) * config.condition_spacing;
        out[idx] = (cx + offset, cy);
    }

    let m = others.len();
    if m > 0 {
        let radius = config.radius(m, n);
        for (slot, &idx) in others.iter().enumerate() {
            let angle = (slot as f64 / m as f64) * TAU - FRAC_PI_2; // start at top
            out[idx] = (cx + radius * angle.cos(), cy + radius * angle.sin());
        }
    }

    out
}

/// Assign `x`/`y` to every node in the graph
pub fn apply(graph: &mut KnowledgeGraph, config: &LayoutConfig) {
    let placed = positions(&graph.nodes, config);
    for (node, (x, y)) in graph.nodes.iter_mut().zip(placed) {
        node.x = x;
        node.y = y;
    }
}

/// Lay out a graph with the default canvas constants
pub fn layout(mut graph: KnowledgeGraph) -> KnowledgeGraph {
    apply(&mut graph, &LayoutConfig::default());
    graph
}
