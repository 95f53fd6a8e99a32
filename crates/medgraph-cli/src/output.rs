//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use medgraph_domain::{FileId, FileRecord, FileStatus, GraphNode, GraphRecord, Icd10Code, Patient};
use medgraph_extractor::RejectionKind;
use medgraph_llm::GraphAnalysis;
use medgraph_session::{BatchReport, RenderSet};
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
    Table,
};

/// One uploaded file as reported after a batch.
#[derive(Debug, Clone)]
pub struct UploadLine {
    /// File name
    pub name: String,
    /// Assigned identifier
    pub id: FileId,
    /// Final status
    pub status: Option<FileStatus>,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The active format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a list of patients.
    pub fn format_patients(&self, patients: &[Patient]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<_> = patients.iter().map(patient_json).collect();
                Ok(serde_json::to_string_pretty(&rows)?)
            }
            OutputFormat::Quiet => Ok(patients
                .iter()
                .map(|p| p.pid.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if patients.is_empty() {
                    return Ok(self.colorize("No patients found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["PID", "Name", "Age", "Created"]);
                for patient in patients {
                    builder.push_record([
                        patient.pid.to_string(),
                        patient.name.clone(),
                        patient.age.to_string(),
                        patient.created_at.to_string(),
                    ]);
                }
                Ok(styled(builder.build()))
            }
        }
    }

    /// Format one patient with their files and graph summary.
    pub fn format_patient(
        &self,
        patient: &Patient,
        files: &[FileRecord],
        record: Option<&GraphRecord>,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = patient_json(patient);
                value["files"] = files.iter().map(file_json).collect();
                value["graph"] = match record {
                    Some(record) => json!({
                        "nodes": record.nodes.len(),
                        "edges": record.edges.len(),
                        "icd10_codes": record.icd10_codes,
                        "analysis": record.graph_analysis,
                        "updated_at": record.updated_at,
                    }),
                    None => serde_json::Value::Null,
                };
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(patient.pid.to_string()),
            OutputFormat::Table => {
                let mut lines = vec![
                    format!("{} {}", self.colorize("PID:", "cyan"), patient.pid),
                    format!("{} {}", self.colorize("Name:", "cyan"), patient.name),
                    format!("{} {}", self.colorize("Age:", "cyan"), patient.age),
                ];

                match record {
                    Some(record) => {
                        lines.push(format!(
                            "{} {} nodes, {} edges",
                            self.colorize("Graph:", "cyan"),
                            record.nodes.len(),
                            record.edges.len()
                        ));
                        if !record.icd10_codes.is_empty() {
                            lines.push(format!(
                                "{} {}",
                                self.colorize("ICD-10:", "cyan"),
                                format_codes(&record.icd10_codes)
                            ));
                        }
                    }
                    None => lines.push(format!("{} empty", self.colorize("Graph:", "cyan"))),
                }

                lines.push(String::new());
                if files.is_empty() {
                    lines.push(self.colorize("No files uploaded.", "yellow"));
                } else {
                    let mut builder = Builder::default();
                    builder.push_record(["File", "Type", "Size", "Status", "Uploaded"]);
                    for file in files {
                        builder.push_record([
                            file.file_name.clone(),
                            file.mime_type.clone(),
                            file.size_bytes.to_string(),
                            self.status(file.status),
                            file.uploaded_at.to_string(),
                        ]);
                    }
                    lines.push(styled(builder.build()));
                }

                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a graph for display.
    pub fn format_graph(&self, render: &RenderSet<'_>, edges_only: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(render)?),
            OutputFormat::Quiet => {
                let ids: Vec<&str> = if edges_only {
                    render.edges.iter().map(|e| e.label.as_str()).collect()
                } else {
                    render.nodes.iter().map(|n| n.id.as_str()).collect()
                };
                Ok(ids.join("\n"))
            }
            OutputFormat::Table => {
                if render.nodes.is_empty() {
                    return Ok(self.colorize("Graph is empty.", "yellow"));
                }

                let mut sections = Vec::new();
                if !edges_only {
                    let mut builder = Builder::default();
                    builder.push_record(["ID", "Label", "Type", "X", "Y", "Links"]);
                    for node in render.nodes {
                        builder.push_record([
                            node.id.clone(),
                            node.label.clone(),
                            node.node_type.to_string(),
                            format!("{:.1}", node.x),
                            format!("{:.1}", node.y),
                            node.connections.len().to_string(),
                        ]);
                    }
                    sections.push(styled(builder.build()));
                }

                if !render.edges.is_empty() {
                    let mut builder = Builder::default();
                    builder.push_record(["Source", "Relationship", "Target", "Strength"]);
                    for edge in &render.edges {
                        builder.push_record([
                            edge.source.clone(),
                            edge.label.clone(),
                            edge.target.clone(),
                            format!("{:.2}", edge.strength),
                        ]);
                    }
                    sections.push(styled(builder.build()));
                }

                Ok(sections.join("\n"))
            }
        }
    }

    /// Format the outcome of an upload batch.
    pub fn format_report(&self, report: &BatchReport, files: &[UploadLine]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rejected: serde_json::Map<String, serde_json::Value> = RejectionKind::ALL
                    .iter()
                    .map(|kind| (kind.to_string(), json!(report.rejected_count(*kind))))
                    .collect();
                let value = json!({
                    "merged": report.merged,
                    "rejected": rejected,
                    "cancelled": report.cancelled,
                    "skipped": report.skipped,
                    "persistence_failures": report.persistence_failures.len(),
                    "nodes_admitted": report.stats.nodes_admitted,
                    "edges_admitted": report.stats.edges_admitted,
                    "files": files.iter().map(|f| json!({
                        "name": f.name,
                        "id": f.id.to_string(),
                        "status": f.status.map(|s| s.as_str()),
                    })).collect::<Vec<_>>(),
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(files
                .iter()
                .map(|f| format!("{}\t{}", f.id, f.status.map(|s| s.as_str()).unwrap_or("unknown")))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["File", "Status"]);
                for file in files {
                    let status = match file.status {
                        Some(status) => self.status(status),
                        None => "unknown".to_string(),
                    };
                    builder.push_record([file.name.clone(), status]);
                }
                Ok(format!("{}\n{}", styled(builder.build()), report.summary()))
            }
        }
    }

    /// Format a whole-graph analysis.
    pub fn format_analysis(&self, analysis: &GraphAnalysis, codes: &[Icd10Code]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let value = json!({
                    "analysis": analysis.analysis,
                    "structured": analysis.structured,
                    "icd10_codes": codes,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(codes
                .iter()
                .map(|c| c.code.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut lines = vec![analysis.analysis.trim().to_string()];

                if let Some(structured) = &analysis.structured {
                    let sections = [
                        ("Key insights", &structured.key_insights),
                        ("Risk factors", &structured.risk_factors),
                        ("Treatment recommendations", &structured.treatment_recommendations),
                        ("Suggested tests", &structured.suggested_tests),
                    ];
                    for (title, items) in sections {
                        if items.is_empty() {
                            continue;
                        }
                        lines.push(String::new());
                        lines.push(self.colorize(title, "cyan"));
                        lines.extend(items.iter().map(|item| format!("  - {}", item)));
                    }
                }

                if !codes.is_empty() {
                    lines.push(String::new());
                    lines.push(self.colorize("ICD-10 codes", "cyan"));
                    for code in codes {
                        if code.description.is_empty() {
                            lines.push(format!("  {}", code.code));
                        } else {
                            lines.push(format!("  {}  {}", code.code, code.description));
                        }
                    }
                }

                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a single-node analysis.
    pub fn format_node_analysis(&self, node: &GraphNode, analysis: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let value = json!({ "node": node, "analysis": analysis });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(analysis.trim().to_string()),
            OutputFormat::Table => Ok(format!(
                "{} ({})\n\n{}",
                self.colorize(&node.label, "cyan"),
                node.node_type,
                analysis.trim()
            )),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn status(&self, status: FileStatus) -> String {
        let color = match status {
            FileStatus::Completed => "green",
            FileStatus::Rejected | FileStatus::Failed => "red",
            FileStatus::Cancelled => "yellow",
            FileStatus::Pending | FileStatus::Processing => "blue",
        };
        self.colorize(status.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn patient_json(patient: &Patient) -> serde_json::Value {
    json!({
        "pid": patient.pid.as_str(),
        "name": patient.name,
        "age": patient.age,
        "created_at": patient.created_at,
    })
}

fn file_json(file: &FileRecord) -> serde_json::Value {
    json!({
        "id": file.id.to_string(),
        "name": file.file_name,
        "mime_type": file.mime_type,
        "size_bytes": file.size_bytes,
        "status": file.status.as_str(),
        "storage_path": file.storage_path,
        "uploaded_at": file.uploaded_at,
    })
}

fn format_codes(codes: &[Icd10Code]) -> String {
    codes
        .iter()
        .map(|c| c.code.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use medgraph_domain::{GraphEdge, KnowledgeGraph, MergeStats, NodeType, PatientId};

    fn patient() -> Patient {
        Patient::new(PatientId::derive("Ana", 34, 42), "Ana Lima", 34, 1_700_000_000)
    }

    fn graph() -> KnowledgeGraph {
        medgraph_domain::layout::layout(KnowledgeGraph::from_parts(
            vec![
                GraphNode::new("dm2", "Type 2 Diabetes", NodeType::Condition),
                GraphNode::new("met", "Metformin", NodeType::Medication),
            ],
            vec![GraphEdge::new("met", "dm2", "treats")],
        ))
    }

    fn render(graph: &KnowledgeGraph) -> RenderSet<'_> {
        RenderSet {
            nodes: &graph.nodes,
            edges: graph.resolved_edges().collect(),
            selected: None,
        }
    }

    #[test]
    fn test_patients_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_patients(&[patient()]).unwrap();
        assert!(output.contains("PID"));
        assert!(output.contains("ANA340042"));
        assert!(output.contains("Ana Lima"));
    }

    #[test]
    fn test_patients_quiet_and_json() {
        let quiet = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(quiet.format_patients(&[patient()]).unwrap(), "ANA340042");

        let json = Formatter::new(OutputFormat::Json, false);
        let output = json.format_patients(&[patient()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["pid"], "ANA340042");
        assert_eq!(value[0]["age"], 34);
    }

    #[test]
    fn test_empty_patients() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_patients(&[]).unwrap();
        assert!(output.contains("No patients found"));
    }

    #[test]
    fn test_graph_json_is_render_set() {
        let graph = graph();
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_graph(&render(&graph), false).unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["nodes"][0]["type"], "condition");
        assert_eq!(value["nodes"][0]["x"], 400.0);
        assert_eq!(value["edges"][0]["label"], "treats");
        assert!(value.get("selected").is_none());
    }

    #[test]
    fn test_graph_table() {
        let graph = graph();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_graph(&render(&graph), false).unwrap();
        assert!(output.contains("Metformin"));
        assert!(output.contains("Relationship"));

        let edges_only = formatter.format_graph(&render(&graph), true).unwrap();
        assert!(!edges_only.contains("Links"));
        assert!(edges_only.contains("treats"));
    }

    #[test]
    fn test_report_json() {
        let mut report = BatchReport::new();
        report.record_merged(MergeStats {
            nodes_admitted: 2,
            ..MergeStats::default()
        });
        report.record_rejected(RejectionKind::ContentRejected);
        let files = vec![UploadLine {
            name: "labs.pdf".to_string(),
            id: FileId::from_value(7),
            status: Some(FileStatus::Completed),
        }];

        let formatter = Formatter::new(OutputFormat::Json, false);
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_report(&report, &files).unwrap()).unwrap();
        assert_eq!(value["merged"], 1);
        assert_eq!(value["rejected"]["content_rejected"], 1);
        assert_eq!(value["files"][0]["status"], "completed");
    }

    #[test]
    fn test_analysis_table_lists_codes() {
        let analysis = GraphAnalysis {
            analysis: "Stable.".to_string(),
            structured: None,
        };
        let codes = vec![Icd10Code::new("E11.9", "Type 2 diabetes mellitus"), Icd10Code::new("I10", "")];
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_analysis(&analysis, &codes).unwrap();
        assert!(output.starts_with("Stable."));
        assert!(output.contains("E11.9  Type 2 diabetes mellitus"));
        assert!(output.contains("  I10"));

        let quiet = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(quiet.format_analysis(&analysis, &codes).unwrap(), "E11.9\nI10");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
