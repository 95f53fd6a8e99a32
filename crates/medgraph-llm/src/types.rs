//! Wire types for the gateway endpoints

use medgraph_domain::{GraphEdge, GraphNode, Icd10Code};
use serde::{Deserialize, Serialize};

/// Error body returned by the gateway on non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default, rename = "isMedical")]
    pub is_medical: Option<bool>,
}

/// Request body for `/analyze-node`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeNodeRequest<'a> {
    pub node: &'a GraphNode,
    pub all_nodes: &'a [GraphNode],
    pub all_edges: &'a [GraphEdge],
}

/// Request body for `/analyze-graph`
#[derive(Debug, Serialize)]
pub(crate) struct AnalyzeGraphRequest<'a> {
    pub nodes: &'a [GraphNode],
    pub edges: &'a [GraphEdge],
}

/// Response body for `/analyze-node`
#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeNodeResponse {
    pub analysis: String,
}

/// Result of a whole-graph analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphAnalysis {
    /// Free-text analysis
    pub analysis: String,

    /// Structured breakdown, when the gateway produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<StructuredAnalysis>,
}

/// Structured sections of a graph analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredAnalysis {
    /// Short summary of the patient
    pub patient_summary: String,

    /// Notable findings
    pub key_insights: Vec<String>,

    /// Suggested treatments
    pub treatment_recommendations: Vec<String>,

    /// Identified risks
    pub risk_factors: Vec<String>,

    /// Recommended follow-up tests
    pub suggested_tests: Vec<String>,

    /// Diagnostic codes
    #[serde(rename = "icd10Codes")]
    pub icd10_codes: Vec<Icd10Code>,

    /// Summary of diagnoses
    pub diagnosis_summary: String,

    /// Notes on current medications
    pub medication_analysis: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use medgraph_domain::NodeType;

    #[test]
    fn test_structured_analysis_camel_case() {
        let json = r#"{
            "analysis": "Stable.",
            "structured": {
                "patientSummary": "Adult with T2D",
                "keyInsights": ["HbA1c trending down"],
                "icd10Codes": [{"code": "E11.9", "description": "Type 2 diabetes"}],
                "medicationAnalysis": "Metformin well tolerated"
            }
        }"#;

        let analysis: GraphAnalysis = serde_json::from_str(json).unwrap();
        let structured = analysis.structured.unwrap();
        assert_eq!(structured.patient_summary, "Adult with T2D");
        assert_eq!(structured.key_insights.len(), 1);
        assert_eq!(structured.icd10_codes[0].code, "E11.9");
        assert!(structured.risk_factors.is_empty());
        assert!(structured.diagnosis_summary.is_empty());
    }

    #[test]
    fn test_analysis_without_structured() {
        let analysis: GraphAnalysis = serde_json::from_str(r#"{"analysis": "text"}"#).unwrap();
        assert!(analysis.structured.is_none());
    }

    #[test]
    fn test_analyze_node_request_shape() {
        let node = GraphNode::new("asthma", "Asthma", NodeType::Condition);
        let nodes = vec![node.clone()];
        let request = AnalyzeNodeRequest {
            node: &node,
            all_nodes: &nodes,
            all_edges: &[],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["node"]["id"], "asthma");
        assert_eq!(json["allNodes"].as_array().unwrap().len(), 1);
        assert!(json["allEdges"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_error_body_flags() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "not medical", "isMedical": false}"#).unwrap();
        assert_eq!(body.is_medical, Some(false));
        assert_eq!(body.error.as_deref(), Some("not medical"));
    }
}
