//! Graph edge module

use serde::{Deserialize, Serialize};

/// Strength assigned to edges the extraction source leaves unweighted
pub const DEFAULT_STRENGTH: f64 = 0.5;

/// A labelled relationship between two nodes
///
/// `strength` only affects rendering weight; merge and layout ignore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node id
    pub source: String,

    /// Target node id
    pub target: String,

    /// Free-text relationship description (e.g. "treated with")
    pub label: String,

    /// Rendering weight in [0.0, 1.0]
    #[serde(default = "default_strength")]
    pub strength: f64,
}

fn default_strength() -> f64 {
    DEFAULT_STRENGTH
}

impl GraphEdge {
    /// Create an edge with the default strength
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
            strength: DEFAULT_STRENGTH,
        }
    }

    /// Set the strength, clamped into [0.0, 1.0]
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = clamp_strength(strength);
        self
    }

    /// The case-folded `source-target-label` key used for deduplication
    pub fn dedup_key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.source.to_lowercase(),
            self.target.to_lowercase(),
            self.label.to_lowercase()
        )
    }

    /// Whether the edge touches the given node id
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Clamp a strength into [0.0, 1.0]; NaN falls back to the default
pub fn clamp_strength(strength: f64) -> f64 {
    if strength.is_nan() {
        DEFAULT_STRENGTH
    } else {
        strength.clamp(0.0, 1.0)
    }
}
