//! Graph accumulator
//!
//! Merges extraction fragments into a patient's running graph. Nodes are
//! deduplicated by case-insensitive label and edges by the case-insensitive
//! `source-target-label` key. The first occurrence always wins: admitted
//! nodes and edges are never rewritten by later fragments, and duplicates
//! inside a single fragment collapse the same way as duplicates against the
//! base graph.
//!
//! Merging several fragments is a sequential fold in the order given, so the
//! same inputs in the same order always produce the same graph.

use crate::{Fragment, KnowledgeGraph};
use std::collections::HashSet;

/// Counts of what a merge admitted and dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Nodes added to the graph
    pub nodes_admitted: usize,

    /// Nodes dropped as duplicates (label already present)
    pub nodes_duplicate: usize,

    /// Edges added to the graph
    pub edges_admitted: usize,

    /// Edges dropped as duplicates
    pub edges_duplicate: usize,
}

impl MergeStats {
    /// Fold another merge's counts into this one
    pub fn absorb(&mut self, other: MergeStats) {
        self.nodes_admitted += other.nodes_admitted;
        self.nodes_duplicate += other.nodes_duplicate;
        self.edges_admitted += other.edges_admitted;
        self.edges_duplicate += other.edges_duplicate;
    }

    /// Whether the merge changed the graph
    pub fn changed(&self) -> bool {
        self.nodes_admitted > 0 || self.edges_admitted > 0
    }
}

/// Merge one fragment into a graph
///
/// Returns the merged graph (base entries first, then admitted entries, each
/// in insertion order) with refreshed `connections`. An empty base goes
/// through the same path, so duplicates inside the first fragment are
/// collapsed too.
pub fn merge(base: KnowledgeGraph, fragment: Fragment) -> (KnowledgeGraph, MergeStats) {
    let KnowledgeGraph { mut nodes, mut edges } = base;
    let mut stats = MergeStats::default();

    let mut seen_labels: HashSet<String> = nodes.iter().map(|n| n.label_key()).collect();
    let mut seen_ids: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let mut seen_edges: HashSet<String> = edges.iter().map(|e| e.dedup_key()).collect();

    for mut node in fragment.nodes {
        let label_key = node.label_key();
        if seen_labels.contains(&label_key) {
            stats.nodes_duplicate += 1;
            continue;
        }
        if seen_ids.contains(&node.id) {
            node.id = unique_id(&node.id, &seen_ids);
        }
        seen_labels.insert(label_key);
        seen_ids.insert(node.id.clone());
        nodes.push(node);
        stats.nodes_admitted += 1;
    }

    for edge in fragment.edges {
        if seen_edges.insert(edge.dedup_key()) {
            edges.push(edge);
            stats.edges_admitted += 1;
        } else {
            stats.edges_duplicate += 1;
        }
    }

    let mut merged = KnowledgeGraph { nodes, edges };
    merged.refresh_connections();
    (merged, stats)
}

/// First free `{id}_{n}` for a node whose id is taken by a different label
fn unique_id(id: &str, taken: &HashSet<String>) -> String {
    (2..)
        .map(|n| format!("{}_{}", id, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| id.to_string())
}

/// Fold fragments into a graph sequentially, in iteration order
pub fn merge_all<I>(base: KnowledgeGraph, fragments: I) -> (KnowledgeGraph, MergeStats)
where
    I: IntoIterator<Item = Fragment>,
{
    let mut total = MergeStats::default();
    let graph = fragments.into_iter().fold(base, |graph, fragment| {
        let (merged, stats) = merge(graph, fragment);
        total.absorb(stats);
        merged
    });
    (graph, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphEdge, GraphNode, NodeType};

    fn node(id: &str, label: &str, node_type: NodeType) -> GraphNode {
        GraphNode::new(id, label, node_type)
    }

    fn labels(graph: &KnowledgeGraph) -> Vec<&str> {
        graph.nodes.iter().map(|n| n.label.as_str()).collect()
    }

    #[test]
    fn test_merge_into_empty_graph() {
        let fragment = Fragment::new(
            vec![node("a", "A", NodeType::Condition), node("b", "B", NodeType::Symptom)],
            vec![GraphEdge::new("a", "b", "causes")],
        );

        let (graph, stats) = merge(KnowledgeGraph::new(), fragment);
        assert_eq!(labels(&graph), vec!["A", "B"]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(stats.nodes_admitted, 2);
        assert_eq!(stats.edges_admitted, 1);
    }

    #[test]
    fn test_merge_growth_scenario() {
        let base = KnowledgeGraph::from_parts(vec![node("a", "A", NodeType::Condition)], vec![]);
        let fragment = Fragment::new(
            vec![node("a", "A", NodeType::Condition), node("b", "B", NodeType::Symptom)],
            vec![GraphEdge::new("a", "b", "causes")],
        );

        let (graph, stats) = merge(base, fragment);
        assert_eq!(labels(&graph), vec!["A", "B"]);
        assert_eq!(graph.edges, vec![GraphEdge::new("a", "b", "causes")]);
        assert_eq!(stats.nodes_duplicate, 1);
    }

    #[test]
    fn test_case_insensitive_dedup_keeps_first_data() {
        let base = KnowledgeGraph::from_parts(
            vec![node("diabetes", "Diabetes", NodeType::Condition).with_attribute("severity", "mild")],
            vec![],
        );
        let fragment = Fragment::new(
            vec![node("diabetes_2", "diabetes", NodeType::Condition).with_attribute("severity", "severe")],
            vec![],
        );

        let (graph, _) = merge(base, fragment);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].label, "Diabetes");
        assert_eq!(graph.nodes[0].data["severity"], crate::AttributeValue::from("mild"));
    }

    #[test]
    fn test_within_fragment_duplicates_collapse() {
        let fragment = Fragment::new(
            vec![
                node("fever", "Fever", NodeType::Symptom),
                node("fever_1", "FEVER", NodeType::Symptom),
            ],
            vec![
                GraphEdge::new("flu", "fever", "causes"),
                GraphEdge::new("Flu", "Fever", "Causes"),
            ],
        );

        let (graph, stats) = merge(KnowledgeGraph::new(), fragment);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].id, "fever");
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(stats.nodes_duplicate, 1);
        assert_eq!(stats.edges_duplicate, 1);
    }

    #[test]
    fn test_id_collision_with_new_label_is_renamed() {
        let base = KnowledgeGraph::from_parts(
            vec![node("x", "Asthma", NodeType::Condition), node("x_2", "Wheezing", NodeType::Symptom)],
            vec![],
        );
        let fragment = Fragment::new(vec![node("x", "Albuterol", NodeType::Medication)], vec![]);

        let (graph, stats) = merge(base, fragment);
        assert_eq!(labels(&graph), vec!["Asthma", "Wheezing", "Albuterol"]);
        assert_eq!(graph.nodes[2].id, "x_3");
        assert_eq!(graph.node("x").unwrap().label, "Asthma");
        assert_eq!(stats.nodes_admitted, 1);
        assert_eq!(stats.nodes_duplicate, 0);
    }

    #[test]
    fn test_id_collision_within_fragment_keeps_both_labels() {
        let forward = Fragment::new(
            vec![node("x", "Asthma", NodeType::Condition), node("x", "Albuterol", NodeType::Medication)],
            vec![],
        );
        let mut reversed = forward.clone();
        reversed.nodes.reverse();

        let (a, _) = merge(KnowledgeGraph::new(), forward);
        let (b, _) = merge(KnowledgeGraph::new(), reversed);

        assert_eq!(labels(&a), vec!["Asthma", "Albuterol"]);
        assert_eq!(labels(&b), vec!["Albuterol", "Asthma"]);
        assert_eq!(a.nodes[1].id, "x_2");
        assert_eq!(b.nodes[1].id, "x_2");
    }

    #[test]
    fn test_edges_with_different_labels_are_distinct() {
        let fragment = Fragment::new(
            vec![],
            vec![
                GraphEdge::new("a", "b", "causes"),
                GraphEdge::new("a", "b", "worsens"),
                GraphEdge::new("b", "a", "causes"),
            ],
        );

        let (graph, _) = merge(KnowledgeGraph::new(), fragment);
        assert_eq!(graph.edges.len(), 3);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let fragment = Fragment::new(
            vec![node("a", "A", NodeType::Condition), node("b", "B", NodeType::Medication)],
            vec![GraphEdge::new("a", "b", "treated with")],
        );

        let (once, _) = merge(KnowledgeGraph::new(), fragment.clone());
        let (twice, stats) = merge(once.clone(), fragment);
        assert_eq!(once, twice);
        assert!(!stats.changed());
    }

    #[test]
    fn test_merge_preserves_insertion_order() {
        let base = KnowledgeGraph::from_parts(
            vec![node("c", "C", NodeType::Symptom), node("a", "A", NodeType::Condition)],
            vec![],
        );
        let fragment = Fragment::new(
            vec![node("z", "Z", NodeType::Procedure), node("b", "B", NodeType::Medication)],
            vec![],
        );

        let (graph, _) = merge(base, fragment);
        assert_eq!(labels(&graph), vec!["C", "A", "Z", "B"]);
    }

    #[test]
    fn test_merge_refreshes_connections() {
        let base = KnowledgeGraph::from_parts(vec![node("a", "A", NodeType::Condition)], vec![]);
        let fragment = Fragment::new(
            vec![node("b", "B", NodeType::Symptom)],
            vec![GraphEdge::new("a", "b", "causes")],
        );

        let (graph, _) = merge(base, fragment);
        assert!(graph.node("a").unwrap().connections.contains("b"));
        assert!(graph.node("b").unwrap().connections.contains("a"));
    }

    #[test]
    fn test_merge_all_is_sequential_fold() {
        let first = Fragment::new(vec![node("htn", "Hypertension", NodeType::Condition)], vec![]);
        let second = Fragment::new(
            vec![
                node("htn_2", "hypertension", NodeType::Condition),
                node("lisinopril", "Lisinopril", NodeType::Medication),
            ],
            vec![GraphEdge::new("htn", "lisinopril", "treated with")],
        );

        let (graph, stats) = merge_all(KnowledgeGraph::new(), vec![first, second]);
        assert_eq!(labels(&graph), vec!["Hypertension", "Lisinopril"]);
        assert_eq!(graph.nodes[0].id, "htn");
        assert_eq!(stats.nodes_admitted, 2);
        assert_eq!(stats.nodes_duplicate, 1);
        assert_eq!(stats.edges_admitted, 1);
    }

    #[test]
    fn test_empty_fragment_is_noop() {
        let base = KnowledgeGraph::from_parts(vec![node("a", "A", NodeType::Condition)], vec![]);
        let (graph, stats) = merge(base.clone(), Fragment::default());
        assert_eq!(graph, base);
        assert_eq!(stats, MergeStats::default());
    }
}
