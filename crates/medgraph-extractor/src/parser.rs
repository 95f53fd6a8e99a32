//! Parse gateway extraction bodies into fragments
//!
//! Parsing is lenient: an unusable body becomes an empty fragment, and
//! individual invalid nodes or edges are skipped with a warning.

use medgraph_domain::{AttributeMap, AttributeValue, Fragment, GraphEdge, GraphNode, NodeType};
use serde_json::{Map, Value};
use tracing::warn;

/// A fragment plus counts of what was dropped on the way in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFragment {
    /// Nodes and edges that passed validation
    pub fragment: Fragment,

    /// Node entries that were skipped
    pub skipped_nodes: usize,

    /// Edge entries that were skipped
    pub skipped_edges: usize,
}

/// Interpretation of a 200 extraction body
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// A (possibly empty) fragment
    Fragment(ParsedFragment),

    /// The body carried `isMedical: false`
    NotMedical(String),
}

/// Parse a 200 body from the extraction endpoint
pub fn parse_extraction_response(body: &str) -> ParsedResponse {
    let json_str = extract_json(body);

    let json: Value = match serde_json::from_str(json_str) {
        Ok(value) => value,
        Err(e) => {
            warn!("Extraction body is not JSON, using empty fragment: {}", e);
            return ParsedResponse::Fragment(ParsedFragment::default());
        }
    };

    let Some(obj) = json.as_object() else {
        warn!("Extraction body is not a JSON object, using empty fragment");
        return ParsedResponse::Fragment(ParsedFragment::default());
    };

    if obj.get("isMedical").and_then(Value::as_bool) == Some(false) {
        let reason = obj
            .get("error")
            .or_else(|| obj.get("reason"))
            .and_then(Value::as_str)
            .unwrap_or("Document is not medical")
            .to_string();
        return ParsedResponse::NotMedical(reason);
    }

    let mut parsed = ParsedFragment::default();

    for (idx, node_json) in array_field(obj, "nodes").iter().enumerate() {
        match parse_node_json(node_json) {
            Ok(node) => parsed.fragment.nodes.push(node),
            Err(e) => {
                warn!("Skipping node {}: {}", idx, e);
                parsed.skipped_nodes += 1;
            }
        }
    }

    for (idx, edge_json) in array_field(obj, "edges").iter().enumerate() {
        match parse_edge_json(edge_json) {
            Ok(edge) => parsed.fragment.edges.push(edge),
            Err(e) => {
                warn!("Skipping edge {}: {}", idx, e);
                parsed.skipped_edges += 1;
            }
        }
    }

    ParsedResponse::Fragment(parsed)
}

/// Extract JSON from a body, handling Markdown code fences
pub(crate) fn extract_json(body: &str) -> &str {
    let trimmed = body.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => return "",
    };

    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match obj.get(key) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!("'{}' is not an array, ignoring it", key);
            &[]
        }
        None => {
            warn!("'{}' is missing from extraction body", key);
            &[]
        }
    }
}

fn required_str(obj: &Map<String, Value>, key: &str) -> Result<String, String> {
    let value = match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(format!("Missing or invalid '{}'", key)),
    };

    if value.is_empty() {
        return Err(format!("'{}' is empty", key));
    }
    Ok(value)
}

fn parse_node_json(json: &Value) -> Result<GraphNode, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Node is not a JSON object".to_string())?;

    let id = required_str(obj, "id")?;
    let label = required_str(obj, "label")?;

    let type_str = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| "Missing or invalid 'type'".to_string())?;
    let node_type =
        NodeType::parse(type_str).ok_or_else(|| format!("Unknown node type '{}'", type_str))?;

    let mut node = GraphNode::new(id, label, node_type);
    if let Some(Value::Object(data)) = obj.get("data") {
        node.data = parse_attributes(data);
    }

    Ok(node)
}

fn parse_attributes(data: &Map<String, Value>) -> AttributeMap {
    let mut attributes = AttributeMap::new();

    for (key, value) in data {
        let attribute = match value {
            Value::String(s) => AttributeValue::Text(s.clone()),
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => AttributeValue::Number(f),
                None => continue,
            },
            Value::Null | Value::Array(_) | Value::Object(_) => {
                warn!("Dropping non-primitive attribute '{}'", key);
                continue;
            }
        };
        attributes.insert(key.clone(), attribute);
    }

    attributes
}

fn parse_edge_json(json: &Value) -> Result<GraphEdge, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Edge is not a JSON object".to_string())?;

    let source = required_str(obj, "source")?;
    let target = required_str(obj, "target")?;
    let label = required_str(obj, "label")?;

    let edge = GraphEdge::new(source, target, label);
    Ok(match obj.get("strength").and_then(Value::as_f64) {
        Some(strength) => edge.with_strength(strength),
        None => edge,
    })
}
