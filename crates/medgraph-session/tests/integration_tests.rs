//! Integration tests for medgraph-session
//!
//! These drive a full session against an in-memory SQLite store, a temporary
//! object store and the mock gateway.

use medgraph_domain::traits::{ObjectStore, PatientStore};
use medgraph_domain::{
    FileStatus, GraphEdge, GraphNode, GraphRecord, Icd10Code, KnowledgeGraph, LayoutConfig,
    NodeType, PatientId, SourceFile,
};
use medgraph_extractor::{ExtractionAdapter, ExtractorConfig, RejectionKind};
use medgraph_gatekeeper::IntakeGate;
use medgraph_llm::{GatewayError, GraphAnalysis, MockGateway, StructuredAnalysis};
use medgraph_session::{delete_patient, PatientSession, SessionError};
use medgraph_store::{LocalObjectStore, SqliteStore};
use std::time::Duration;
use tempfile::TempDir;

const LABS: &str = r#"{
    "nodes": [
        {"id": "dm2", "label": "Type 2 Diabetes", "type": "condition"},
        {"id": "met", "label": "Metformin", "type": "medication"},
        {"id": "a1c", "label": "HbA1c", "type": "procedure", "data": {"value": 7.2}}
    ],
    "edges": [
        {"source": "met", "target": "dm2", "label": "treats", "strength": 0.8},
        {"source": "a1c", "target": "dm2", "label": "monitors"}
    ]
}"#;

const VISIT: &str = r#"{
    "nodes": [
        {"id": "x1", "label": "type 2 diabetes", "type": "condition"},
        {"id": "fat", "label": "Fatigue", "type": "symptom"}
    ],
    "edges": [
        {"source": "fat", "target": "x1", "label": "caused by"}
    ]
}"#;

type TestSession = PatientSession<MockGateway, SqliteStore, LocalObjectStore>;

fn pdf(name: &str) -> SourceFile {
    SourceFile::new(name, "application/pdf", b"%PDF-1.7".to_vec())
}

fn adapter(gateway: MockGateway, max_concurrent: usize) -> ExtractionAdapter<MockGateway> {
    let config = ExtractorConfig {
        max_concurrent_extractions: max_concurrent,
        ..ExtractorConfig::default()
    };
    ExtractionAdapter::new(gateway, IntakeGate::default(), config).unwrap()
}

fn open_session(gateway: MockGateway, max_concurrent: usize) -> (TestSession, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStore::new(":memory:").unwrap();
    let patient = store.register_patient("Maria Souza", 58, 1000).unwrap();
    let objects = LocalObjectStore::new(dir.path()).unwrap();
    let session =
        PatientSession::open(adapter(gateway, max_concurrent), store, objects, &patient.pid)
            .unwrap();
    (session, dir)
}

#[tokio::test]
async fn test_open_unknown_patient() {
    let dir = tempfile::tempdir().unwrap();
    let result = PatientSession::open(
        adapter(MockGateway::default(), 1),
        SqliteStore::new(":memory:").unwrap(),
        LocalObjectStore::new(dir.path()).unwrap(),
        &PatientId::derive("Nobody", 1, 1),
    );
    assert!(matches!(result, Err(SessionError::NotFound(_))));
}

#[tokio::test]
async fn test_batch_merges_and_persists() {
    let gateway = MockGateway::default()
        .with_response("labs.pdf", LABS)
        .with_response("visit.pdf", VISIT);
    let (mut session, dir) = open_session(gateway, 3);

    let labs = session.enqueue(pdf("labs.pdf"));
    let visit = session.enqueue(pdf("visit.pdf"));
    assert_eq!(session.file_status(labs), Some(FileStatus::Pending));

    let report = session.process_pending().await.unwrap();

    assert_eq!(report.merged, 2);
    assert_eq!(report.stats.nodes_admitted, 4);
    assert_eq!(report.stats.nodes_duplicate, 1);
    assert!(report.persistence_failures.is_empty());
    assert_eq!(session.pending_count(), 0);
    assert_eq!(session.file_status(labs), Some(FileStatus::Completed));
    assert_eq!(session.file_status(visit), Some(FileStatus::Completed));

    // First-seen label wins; the later duplicate's edge is kept verbatim
    let graph = session.graph();
    let labels: Vec<_> = graph.nodes.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, vec!["Type 2 Diabetes", "Metformin", "HbA1c", "Fatigue"]);
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.resolved_edges().count(), 2);

    // The single condition sits at the center
    let condition = graph.node("dm2").unwrap();
    assert_eq!((condition.x, condition.y), LayoutConfig::default().center());

    // Graph, file rows and uploads are written through
    let pid = session.patient().pid.clone();
    let stored = session.store().load_graph(&pid).unwrap().unwrap();
    let stored_ids: Vec<_> = stored.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(stored_ids, vec!["dm2", "met", "a1c", "fat"]);
    assert_eq!(stored.edges, graph.edges);

    let files = session.store().list_files(&pid).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].file_name, "labs.pdf");
    assert!(files.iter().all(|f| f.status == FileStatus::Completed));
    assert!(dir.path().join(&files[0].storage_path).is_file());
}

#[tokio::test]
async fn test_merge_growth_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("medgraph.db");

    let pid = {
        let mut store = SqliteStore::new(&db).unwrap();
        let patient = store.register_patient("Ana", 40, 1).unwrap();
        let mut record = GraphRecord::empty(patient.pid.clone(), 1);
        record.set_graph(&KnowledgeGraph::from_parts(
            vec![
                GraphNode::new("htn", "Hypertension", NodeType::Condition),
                GraphNode::new("lis", "Lisinopril", NodeType::Medication),
            ],
            vec![GraphEdge::new("lis", "htn", "treats")],
        ));
        store.save_graph(&record).unwrap();
        patient.pid
    };

    let gateway = MockGateway::default().with_response(
        "new.pdf",
        r#"{
            "nodes": [
                {"id": "n1", "label": "LISINOPRIL", "type": "medication"},
                {"id": "n2", "label": "Cough", "type": "symptom"},
                {"id": "n3", "label": "Dizziness", "type": "symptom"}
            ],
            "edges": [{"source": "lis", "target": "n2", "label": "causes"}]
        }"#,
    );
    let mut session = PatientSession::open(
        adapter(gateway, 2),
        SqliteStore::new(&db).unwrap(),
        LocalObjectStore::new(dir.path().join("objects")).unwrap(),
        &pid,
    )
    .unwrap();
    assert_eq!(session.graph().node_count(), 2);

    session.enqueue(pdf("new.pdf"));
    let report = session.process_pending().await.unwrap();

    assert_eq!(report.stats.nodes_admitted, 2);
    assert_eq!(report.stats.nodes_duplicate, 1);
    let graph = session.graph();
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.node("lis").unwrap().label, "Lisinopril");
    assert!(graph.node("lis").unwrap().connections.contains("n2"));

    let reopened = SqliteStore::new(&db).unwrap();
    assert_eq!(reopened.load_graph(&pid).unwrap().unwrap().nodes.len(), 4);
}

#[tokio::test]
async fn test_rejections_do_not_abort_siblings() {
    let gateway = MockGateway::default()
        .with_response("labs.pdf", LABS)
        .with_error(
            "cat.jpg",
            GatewayError::NotMedical("This is a photo of a cat".to_string()),
        )
        .with_error("busy.pdf", GatewayError::RateLimited("slow down".to_string()))
        .with_response("visit.pdf", VISIT);
    let (mut session, _dir) = open_session(gateway, 2);

    let labs = session.enqueue(pdf("labs.pdf"));
    let cat = session.enqueue(SourceFile::new("cat.jpg", "image/jpeg", vec![0xFFu8, 0xD8]));
    let busy = session.enqueue(pdf("busy.pdf"));
    let visit = session.enqueue(pdf("visit.pdf"));

    let report = session.process_pending().await.unwrap();

    assert_eq!(report.merged, 2);
    assert_eq!(report.rejected_count(RejectionKind::ContentRejected), 1);
    assert_eq!(report.rejected_count(RejectionKind::RateLimited), 1);
    assert!(!session.is_extraction_disabled());

    assert_eq!(session.file_status(labs), Some(FileStatus::Completed));
    assert_eq!(session.file_status(cat), Some(FileStatus::Rejected));
    assert_eq!(session.file_status(busy), Some(FileStatus::Failed));
    assert_eq!(session.file_status(visit), Some(FileStatus::Completed));
    assert!(session.graph().node_by_label("cat").is_none());
    assert_eq!(session.graph().node_count(), 4);
}

#[tokio::test]
async fn test_quota_exhaustion_stops_dispatch() {
    let gateway = MockGateway::default()
        .with_error("a.pdf", GatewayError::QuotaExhausted("no credits".to_string()))
        .with_response("b.pdf", LABS);
    let (mut session, _dir) = open_session(gateway.clone(), 1);

    let a = session.enqueue(pdf("a.pdf"));
    let b = session.enqueue(pdf("b.pdf"));
    session.enqueue(pdf("c.pdf"));

    let report = session.process_pending().await.unwrap();

    assert_eq!(report.rejected_count(RejectionKind::QuotaExhausted), 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(gateway.extracted_files(), vec!["a.pdf"]);
    assert!(session.is_extraction_disabled());
    assert_eq!(session.file_status(a), Some(FileStatus::Failed));
    assert_eq!(session.file_status(b), Some(FileStatus::Pending));
    assert_eq!(session.pending_count(), 2);
    assert!(session.graph().is_empty());

    let again = session.process_pending().await;
    assert!(matches!(again, Err(SessionError::ExtractionDisabled)));
    assert_eq!(gateway.extracted_files().len(), 1);
}

#[tokio::test]
async fn test_cancel_before_processing() {
    let gateway = MockGateway::default().with_response("labs.pdf", LABS);
    let (mut session, _dir) = open_session(gateway.clone(), 3);

    let id = session.enqueue(pdf("labs.pdf"));
    assert!(session.cancel(id));
    assert!(!session.cancel(id));

    let report = session.process_pending().await.unwrap();

    assert!(report.is_empty());
    assert_eq!(gateway.call_count(), 0);
    assert_eq!(session.file_status(id), Some(FileStatus::Cancelled));
    assert!(session.graph().is_empty());
}

#[tokio::test]
async fn test_handle_cancel_status_survives_batches() {
    let gateway = MockGateway::default()
        .with_response("labs.pdf", LABS)
        .with_response("visit.pdf", VISIT);
    let (mut session, _dir) = open_session(gateway.clone(), 2);

    let labs = session.enqueue(pdf("labs.pdf"));
    let visit = session.enqueue(pdf("visit.pdf"));
    assert!(session.cancel_handle().cancel(labs));
    assert_eq!(session.file_status(labs), Some(FileStatus::Cancelled));

    let report = session.process_pending().await.unwrap();
    assert_eq!(report.merged, 1);
    assert_eq!(gateway.extracted_files(), vec!["visit.pdf"]);

    let again = session.process_pending().await.unwrap();
    assert!(again.is_empty());
    assert_eq!(session.file_status(labs), Some(FileStatus::Cancelled));
    assert_eq!(session.file_status(visit), Some(FileStatus::Completed));
}

#[tokio::test]
async fn test_cancel_during_extraction_suppresses_merge() {
    let gateway = MockGateway::default()
        .with_response("slow.pdf", LABS)
        .with_delay("slow.pdf", Duration::from_millis(300))
        .with_response("fast.pdf", VISIT);
    let (mut session, _dir) = open_session(gateway.clone(), 3);

    let slow = session.enqueue(pdf("slow.pdf"));
    let fast = session.enqueue(pdf("fast.pdf"));
    let handle = session.cancel_handle();

    let (report, cancelled) = tokio::join!(session.process_pending(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel(slow)
    });
    let report = report.unwrap();

    assert!(cancelled);
    let mut called = gateway.extracted_files();
    called.sort();
    assert_eq!(called, vec!["fast.pdf", "slow.pdf"]);
    assert_eq!(report.merged, 1);
    assert_eq!(report.cancelled, 1);
    assert_eq!(session.file_status(slow), Some(FileStatus::Cancelled));
    assert_eq!(session.file_status(fast), Some(FileStatus::Completed));

    let graph = session.graph();
    assert!(graph.node_by_label("Metformin").is_none());
    assert_eq!(graph.node_count(), 2);

    let pid = session.patient().pid.clone();
    let files = session.store().list_files(&pid).unwrap();
    assert_eq!(files[0].status, FileStatus::Cancelled);
}

/// Object store whose writes always fail
struct FullDisk;

impl ObjectStore for FullDisk {
    type Error = String;

    fn put(&self, _path: &str, _bytes: &[u8]) -> Result<(), Self::Error> {
        Err("no space left on device".to_string())
    }

    fn remove(&self, _path: &str) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn exists(&self, _path: &str) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_persistence_failure_keeps_graph() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let patient = store.register_patient("Ana", 40, 1).unwrap();
    let gateway = MockGateway::default().with_response("labs.pdf", LABS);
    let mut session =
        PatientSession::open(adapter(gateway, 1), store, FullDisk, &patient.pid).unwrap();

    let id = session.enqueue(pdf("labs.pdf"));
    let report = session.process_pending().await.unwrap();

    assert_eq!(report.persistence_failures.len(), 1);
    let failure = &report.persistence_failures[0];
    assert_eq!(failure.file, Some(id));
    assert!(matches!(
        &failure.error,
        SessionError::Persistence(detail) if detail.contains("no space left on device")
    ));
    assert_eq!(report.merged, 1);
    assert_eq!(session.file_status(id), Some(FileStatus::Completed));
    assert_eq!(session.graph().node_count(), 3);
    assert!(session.store().list_files(&patient.pid).unwrap().is_empty());
    assert_eq!(
        session.store().load_graph(&patient.pid).unwrap().unwrap().nodes.len(),
        3
    );
}

#[tokio::test]
async fn test_analyze_graph_stores_structured_codes() {
    let analysis = GraphAnalysis {
        analysis: "Diabetes is controlled.".to_string(),
        structured: Some(StructuredAnalysis {
            patient_summary: "Adult with T2D".to_string(),
            icd10_codes: vec![Icd10Code::new("E11.9", "Type 2 diabetes mellitus")],
            ..StructuredAnalysis::default()
        }),
    };
    let gateway = MockGateway::default()
        .with_response("labs.pdf", LABS)
        .with_graph_analysis(Ok(analysis.clone()));
    let (mut session, _dir) = open_session(gateway, 1);
    session.enqueue(pdf("labs.pdf"));
    session.process_pending().await.unwrap();

    let result = session.analyze_graph().await.unwrap();
    assert_eq!(result, analysis);

    let pid = session.patient().pid.clone();
    let stored = session.store().load_graph(&pid).unwrap().unwrap();
    assert_eq!(stored.graph_analysis.as_deref(), Some("Diabetes is controlled."));
    assert_eq!(
        stored.icd10_codes,
        vec![Icd10Code::new("E11.9", "Type 2 diabetes mellitus")]
    );
    assert_eq!(stored.nodes.len(), 3);
}

#[tokio::test]
async fn test_analyze_graph_scans_free_text() {
    let gateway = MockGateway::default().with_graph_analysis(Ok(GraphAnalysis {
        analysis: "Findings consistent with essential hypertension (I10) and E78.5.".to_string(),
        structured: None,
    }));
    let (mut session, _dir) = open_session(gateway, 1);

    session.analyze_graph().await.unwrap();

    let codes: Vec<_> = session
        .record()
        .icd10_codes
        .iter()
        .map(|c| c.code.as_str())
        .collect();
    assert_eq!(codes, vec!["I10", "E78.5"]);
}

#[tokio::test]
async fn test_analyze_graph_error_leaves_record() {
    let gateway = MockGateway::default()
        .with_graph_analysis(Err(GatewayError::RateLimited("slow down".to_string())));
    let (mut session, _dir) = open_session(gateway, 1);

    let result = session.analyze_graph().await;
    assert!(matches!(
        result,
        Err(SessionError::Gateway(GatewayError::RateLimited(_)))
    ));
    assert!(session.record().graph_analysis.is_none());
}

#[tokio::test]
async fn test_select_and_analyze_node() {
    let gateway = MockGateway::default()
        .with_response("labs.pdf", LABS)
        .with_node_analysis("Metformin is first-line therapy.");
    let (mut session, _dir) = open_session(gateway, 1);
    session.enqueue(pdf("labs.pdf"));
    session.process_pending().await.unwrap();

    assert_eq!(session.select_node("met").unwrap().label, "Metformin");
    assert_eq!(session.selected_node().map(|n| n.id.as_str()), Some("met"));
    assert!(matches!(
        session.select_node("missing"),
        Err(SessionError::NotFound(_))
    ));
    assert_eq!(session.selected_node().map(|n| n.id.as_str()), Some("met"));

    let render = session.render_set();
    assert_eq!(render.nodes.len(), 3);
    assert_eq!(render.edges.len(), 2);
    assert_eq!(render.selected, Some("met"));

    assert_eq!(
        session.analyze_node("met").await.unwrap(),
        "Metformin is first-line therapy."
    );
    assert!(matches!(
        session.analyze_node("nope").await,
        Err(SessionError::NotFound(_))
    ));

    session.clear_selection();
    assert!(session.selected_node().is_none());
}

#[tokio::test]
async fn test_delete_patient_removes_uploads() {
    let gateway = MockGateway::default().with_response("labs.pdf", LABS);
    let (mut session, dir) = open_session(gateway, 1);
    session.enqueue(pdf("labs.pdf"));
    session.process_pending().await.unwrap();

    let pid = session.patient().pid.clone();
    let path = session.store().list_files(&pid).unwrap()[0].storage_path.clone();
    assert!(session.objects().exists(&path).unwrap());

    assert!(session.delete().unwrap());
    assert!(!dir.path().join(&path).exists());
}

#[test]
fn test_delete_unknown_patient() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStore::new(":memory:").unwrap();
    let objects = LocalObjectStore::new(dir.path()).unwrap();

    let deleted = delete_patient(&mut store, &objects, &PatientId::derive("Nobody", 1, 1));
    assert!(!deleted.unwrap());
}
