//! Graph node module

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Kind of medical entity a node represents
///
/// Drives both grouping in the presentation layer and centrality in layout:
/// only `Condition` nodes are placed at the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// The patient themself
    Patient,

    /// A diagnosed medical condition
    Condition,

    /// A prescribed or reported medication
    Medication,

    /// A medical procedure
    Procedure,

    /// An observed symptom
    Symptom,
}

impl NodeType {
    /// All node types, in display order
    pub const ALL: [NodeType; 5] = [
        NodeType::Patient,
        NodeType::Condition,
        NodeType::Medication,
        NodeType::Procedure,
        NodeType::Symptom,
    ];

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Patient => "patient",
            NodeType::Condition => "condition",
            NodeType::Medication => "medication",
            NodeType::Procedure => "procedure",
            NodeType::Symptom => "symptom",
        }
    }

    /// Parse a node type, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "patient" => Some(NodeType::Patient),
            "condition" => Some(NodeType::Condition),
            "medication" => Some(NodeType::Medication),
            "procedure" => Some(NodeType::Procedure),
            "symptom" => Some(NodeType::Symptom),
            _ => None,
        }
    }

    /// Whether this type is laid out at the center of the graph
    pub fn is_central(&self) -> bool {
        matches!(self, NodeType::Condition)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A primitive auxiliary attribute (dosage, severity, onset date, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean flag
    Bool(bool),

    /// Numeric value
    Number(f64),

    /// Free text
    Text(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// Open key/value bag of node attributes, opaque to merge and layout
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A medical entity in a patient's knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable identifier, unique within a graph
    pub id: String,

    /// Human-readable name; the dedup key (case-insensitive)
    pub label: String,

    /// Entity kind
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Horizontal canvas position, assigned by layout
    #[serde(default)]
    pub x: f64,

    /// Vertical canvas position, assigned by layout
    #[serde(default)]
    pub y: f64,

    /// Ids of neighboring nodes, derived from edges
    #[serde(default)]
    pub connections: BTreeSet<String>,

    /// Auxiliary attributes, passed through untouched
    #[serde(default)]
    pub data: AttributeMap,
}

impl GraphNode {
    /// Create a node with no position, connections or attributes
    pub fn new(id: impl Into<String>, label: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type,
            x: 0.0,
            y: 0.0,
            connections: BTreeSet::new(),
            data: AttributeMap::new(),
        }
    }

    /// Attach an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// The case-folded label used for deduplication
    pub fn label_key(&self) -> String {
        self.label.to_lowercase()
    }

    /// Euclidean distance from this node to a point
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_parse_ignores_case() {
        assert_eq!(NodeType::parse("Condition"), Some(NodeType::Condition));
        assert_eq!(NodeType::parse(" MEDICATION "), Some(NodeType::Medication));
        assert_eq!(NodeType::parse("lab_result"), None);
    }

    #[test]
    fn test_node_type_round_trip() {
        for t in NodeType::ALL {
            assert_eq!(NodeType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_only_conditions_are_central() {
        assert!(NodeType::Condition.is_central());
        assert!(!NodeType::Symptom.is_central());
        assert!(!NodeType::Patient.is_central());
    }

    #[test]
    fn test_label_key_is_lowercase() {
        let node = GraphNode::new("diabetes", "Type 2 Diabetes", NodeType::Condition);
        assert_eq!(node.label_key(), "type 2 diabetes");
    }

    #[test]
    fn test_node_serializes_type_field() {
        let node = GraphNode::new("metformin", "Metformin", NodeType::Medication)
            .with_attribute("dosage", "500mg")
            .with_attribute("daily", true);
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["type"], "medication");
        assert_eq!(json["data"]["dosage"], "500mg");
        assert_eq!(json["data"]["daily"], true);
    }

    #[test]
    fn test_node_deserializes_without_optional_fields() {
        let json = r#"{"id": "fever", "label": "Fever", "type": "symptom"}"#;
        let node: GraphNode = serde_json::from_str(json).unwrap();

        assert_eq!(node.node_type, NodeType::Symptom);
        assert_eq!((node.x, node.y), (0.0, 0.0));
        assert!(node.connections.is_empty());
        assert!(node.data.is_empty());
    }

    #[test]
    fn test_attribute_value_untagged() {
        let values: Vec<AttributeValue> =
            serde_json::from_str(r#"[true, 2.5, "mild"]"#).unwrap();
        assert_eq!(values[0], AttributeValue::Bool(true));
        assert_eq!(values[1], AttributeValue::Number(2.5));
        assert_eq!(values[2], AttributeValue::Text("mild".to_string()));
    }
}
