//! Patient session: the single writer of one patient's graph

use crate::error::SessionError;
use crate::icd10;
use crate::pending::{CancelHandle, PendingFile, PendingQueue};
use crate::report::BatchReport;
use futures::stream::{FuturesOrdered, StreamExt};
use medgraph_domain::traits::{ObjectStore, PatientStore};
use medgraph_domain::{
    layout, merge, FileId, FileRecord, FileStatus, Fragment, GraphEdge, GraphNode, GraphRecord,
    KnowledgeGraph, LayoutConfig, Patient, PatientId, SourceFile,
};
use medgraph_extractor::{ExtractionAdapter, ExtractionOutcome, RejectionKind};
use medgraph_llm::{GraphAnalysis, KnowledgeGateway};
use medgraph_store::{now_secs, storage_path};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use tracing::{debug, info, warn};

fn store_error<E: Display>(e: E) -> SessionError {
    SessionError::Store(e.to_string())
}

/// Nodes and resolvable edges handed to a presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct RenderSet<'a> {
    /// Laid-out nodes
    pub nodes: &'a [GraphNode],

    /// Edges whose endpoints both exist
    pub edges: Vec<&'a GraphEdge>,

    /// Currently selected node id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<&'a str>,
}

/// Everything the session mutates, kept apart from the adapter so batch
/// processing can borrow both at once
struct SessionState<S, O> {
    store: S,
    objects: O,
    layout: LayoutConfig,
    patient: Patient,
    record: GraphRecord,
    graph: KnowledgeGraph,
    selected: Option<String>,
    statuses: HashMap<FileId, FileStatus>,
    persisted: HashSet<FileId>,
    extraction_disabled: bool,
}

impl<S, O> SessionState<S, O>
where
    S: PatientStore,
    S::Error: Display,
    O: ObjectStore,
    O::Error: Display,
{
    /// Store the raw bytes and the metadata row for a file about to be extracted
    fn persist_upload(&mut self, entry: &PendingFile, report: &mut BatchReport) {
        self.statuses.insert(entry.id, FileStatus::Processing);

        let path = storage_path(&self.patient.pid, entry.id, &entry.file.file_name);
        if let Err(e) = self.objects.put(&path, &entry.file.bytes) {
            warn!(file = %entry.file.file_name, error = %e, "Failed to store upload");
            report.record_persistence_failure(
                Some(entry.id),
                format!("upload {}: {}", entry.file.file_name, e),
            );
            return;
        }

        let record = FileRecord {
            id: entry.id,
            patient_pid: self.patient.pid.clone(),
            file_name: entry.file.file_name.clone(),
            mime_type: entry.file.mime_type.clone(),
            storage_path: path.clone(),
            size_bytes: entry.file.size(),
            status: FileStatus::Processing,
            uploaded_at: entry.uploaded_at,
        };

        match self.store.record_file(record) {
            Ok(()) => {
                self.persisted.insert(entry.id);
            }
            Err(e) => {
                warn!(file = %entry.file.file_name, error = %e, "Failed to record file metadata");
                report.record_persistence_failure(
                    Some(entry.id),
                    format!("file record {}: {}", entry.file.file_name, e),
                );
                if let Err(e) = self.objects.remove(&path) {
                    debug!(path = %path, error = %e, "Could not remove orphaned upload");
                }
            }
        }
    }

    fn set_status(&mut self, id: FileId, status: FileStatus, report: &mut BatchReport) {
        self.statuses.insert(id, status);
        if !self.persisted.contains(&id) {
            return;
        }
        if let Err(e) = self.store.update_file_status(id, status) {
            warn!(file_id = %id, %status, error = %e, "Failed to update file status");
            report.record_persistence_failure(Some(id), format!("status {}: {}", status, e));
        }
    }

    /// Write the current graph and analysis through to the store
    fn persist_graph(&mut self) -> Result<(), SessionError> {
        self.record.set_graph(&self.graph);
        self.record.updated_at = now_secs();
        self.store.save_graph(&self.record).map_err(store_error)
    }

    fn merge_fragment(&mut self, fragment: Fragment, report: &mut BatchReport) {
        let (mut merged, stats) = merge(std::mem::take(&mut self.graph), fragment);
        layout::apply(&mut merged, &self.layout);
        self.graph = merged;
        report.record_merged(stats);

        debug!(
            patient = %self.patient.pid,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            admitted = stats.nodes_admitted,
            "Fragment merged"
        );

        // The merged graph stays in memory even if the upsert fails
        if let Err(e) = self.persist_graph() {
            warn!(patient = %self.patient.pid, error = %e, "Failed to save graph");
            report.record_persistence_failure(None, format!("graph upsert: {}", e));
        }
    }

    /// Apply one completed extraction, in upload order
    fn apply(
        &mut self,
        pending: &PendingQueue,
        entry: PendingFile,
        outcome: ExtractionOutcome,
        report: &mut BatchReport,
    ) {
        let name = entry.file.file_name;
        if pending.take(entry.id).is_none() {
            info!(file = %name, "File cancelled during extraction; result discarded");
            self.set_status(entry.id, FileStatus::Cancelled, report);
            report.record_cancelled();
            return;
        }

        match outcome {
            ExtractionOutcome::Fragment(fragment) => {
                self.merge_fragment(fragment, report);
                self.set_status(entry.id, FileStatus::Completed, report);
            }
            ExtractionOutcome::Rejected { kind, reason } => {
                report.record_rejected(kind);
                let status = match kind {
                    RejectionKind::ContentRejected => FileStatus::Rejected,
                    _ => FileStatus::Failed,
                };
                self.set_status(entry.id, status, report);

                if kind.is_fatal() {
                    warn!(file = %name, %reason, "Quota exhausted; extraction disabled for this session");
                    self.extraction_disabled = true;
                } else {
                    info!(file = %name, %kind, %reason, "File rejected");
                }
            }
        }
    }
}

/// One patient's working session
///
/// Owns the patient, the accumulated graph, the selected node, per-file
/// statuses and the queue of pending uploads. Every graph change goes through
/// [`merge`] followed by [`layout::apply`], and is written through to the
/// store.
///
/// # Examples
///
/// ```no_run
/// use medgraph_domain::SourceFile;
/// use medgraph_extractor::{ExtractionAdapter, ExtractorConfig};
/// use medgraph_gatekeeper::IntakeGate;
/// use medgraph_llm::MockGateway;
/// use medgraph_session::PatientSession;
/// use medgraph_store::{now_secs, LocalObjectStore, SqliteStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = SqliteStore::new("medgraph.db")?;
/// let patient = store.register_patient("Ana Lima", 34, now_secs())?;
/// let adapter = ExtractionAdapter::new(
///     MockGateway::default(),
///     IntakeGate::default(),
///     ExtractorConfig::default(),
/// )?;
///
/// let mut session =
///     PatientSession::open(adapter, store, LocalObjectStore::new("uploads")?, &patient.pid)?;
/// session.enqueue(SourceFile::new("labs.pdf", "application/pdf", std::fs::read("labs.pdf")?));
/// let report = session.process_pending().await?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub struct PatientSession<G, S, O>
where
    G: KnowledgeGateway,
{
    adapter: ExtractionAdapter<G>,
    state: SessionState<S, O>,
    pending: PendingQueue,
}

impl<G, S, O> PatientSession<G, S, O>
where
    G: KnowledgeGateway,
    S: PatientStore,
    S::Error: Display,
    O: ObjectStore,
    O::Error: Display,
{
    /// Open a session for an existing patient
    ///
    /// Loads the stored graph (an empty one if the patient has none yet) and
    /// the status of every previously uploaded file.
    pub fn open(
        adapter: ExtractionAdapter<G>,
        store: S,
        objects: O,
        pid: &PatientId,
    ) -> Result<Self, SessionError> {
        let patient = store
            .get_patient(pid)
            .map_err(store_error)?
            .ok_or_else(|| SessionError::NotFound(format!("patient {}", pid)))?;

        let record = store
            .load_graph(pid)
            .map_err(store_error)?
            .unwrap_or_else(|| GraphRecord::empty(pid.clone(), now_secs()));
        let mut graph = record.graph();
        graph.refresh_connections();

        let mut statuses = HashMap::new();
        let mut persisted = HashSet::new();
        for file in store.list_files(pid).map_err(store_error)? {
            statuses.insert(file.id, file.status);
            persisted.insert(file.id);
        }

        info!(
            patient = %pid,
            nodes = graph.node_count(),
            files = statuses.len(),
            "Session opened"
        );

        Ok(Self {
            adapter,
            state: SessionState {
                store,
                objects,
                layout: LayoutConfig::default(),
                patient,
                record,
                graph,
                selected: None,
                statuses,
                persisted,
                extraction_disabled: false,
            },
            pending: PendingQueue::new(),
        })
    }

    /// Use different canvas constants for subsequent layouts
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.state.layout = layout;
        self
    }

    /// The session's patient
    pub fn patient(&self) -> &Patient {
        &self.state.patient
    }

    /// The accumulated, laid-out graph
    pub fn graph(&self) -> &KnowledgeGraph {
        &self.state.graph
    }

    /// The persisted record as of the last write
    pub fn record(&self) -> &GraphRecord {
        &self.state.record
    }

    /// The patient store
    pub fn store(&self) -> &S {
        &self.state.store
    }

    /// The object store
    pub fn objects(&self) -> &O {
        &self.state.objects
    }

    /// Whether a quota error has disabled extraction
    pub fn is_extraction_disabled(&self) -> bool {
        self.state.extraction_disabled
    }

    /// Queue a file for the next batch
    pub fn enqueue(&mut self, file: SourceFile) -> FileId {
        let name = file.file_name.clone();
        let id = self.pending.push(file, now_secs());
        self.state.statuses.insert(id, FileStatus::Pending);
        debug!(file = %name, file_id = %id, "File queued");
        id
    }

    /// Number of files waiting for the next batch
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Cancel a pending file
    ///
    /// Returns `false` if the file is not pending.
    pub fn cancel(&mut self, id: FileId) -> bool {
        let cancelled = self.pending.cancel(id);
        self.settle_cancelled();
        cancelled
    }

    /// Record cancellations made through handles in the status map
    fn settle_cancelled(&mut self) {
        for id in self.pending.drain_cancelled() {
            self.state.statuses.insert(id, FileStatus::Cancelled);
        }
    }

    /// A handle for cancelling files while a batch is running
    pub fn cancel_handle(&self) -> CancelHandle {
        self.pending.cancel_handle()
    }

    /// Current status of a file seen by this session
    pub fn file_status(&self, id: FileId) -> Option<FileStatus> {
        if self.pending.was_cancelled(id) {
            return Some(FileStatus::Cancelled);
        }
        self.state.statuses.get(&id).copied()
    }

    /// Extract and merge every pending file
    ///
    /// Each file is uploaded and recorded right before its extraction call.
    /// At most `max_concurrent_extractions` calls are in flight; results are
    /// applied one at a time in upload order, and the graph is saved after
    /// every merge. A quota error stops dispatch: files not yet sent stay
    /// pending and later batches fail with [`SessionError::ExtractionDisabled`].
    pub async fn process_pending(&mut self) -> Result<BatchReport, SessionError> {
        self.settle_cancelled();
        if self.state.extraction_disabled {
            return Err(SessionError::ExtractionDisabled);
        }

        let mut report = BatchReport::new();
        let batch = self.pending.snapshot();
        if batch.is_empty() {
            return Ok(report);
        }

        let Self {
            adapter,
            state,
            pending,
        } = self;
        let adapter = &*adapter;
        let limit = adapter.config().max_concurrent_extractions.max(1);

        info!(
            patient = %state.patient.pid,
            files = batch.len(),
            limit,
            "Processing pending files"
        );

        let extract = move |entry: PendingFile| async move {
            let outcome = adapter.extract(&entry.file).await;
            (entry, outcome)
        };

        let mut queue = batch.into_iter();
        let mut in_flight = FuturesOrdered::new();
        loop {
            while in_flight.len() < limit && !state.extraction_disabled {
                let Some(entry) = queue.next() else {
                    break;
                };
                if !pending.contains(entry.id) {
                    debug!(file = %entry.file.file_name, "Skipping cancelled file");
                    state.statuses.insert(entry.id, FileStatus::Cancelled);
                    report.record_cancelled();
                    continue;
                }
                state.persist_upload(&entry, &mut report);
                in_flight.push_back(extract(entry));
            }

            let Some((entry, outcome)) = in_flight.next().await else {
                break;
            };
            state.apply(pending, entry, outcome, &mut report);
        }

        for entry in queue {
            if pending.contains(entry.id) {
                report.skipped += 1;
            } else {
                state.statuses.insert(entry.id, FileStatus::Cancelled);
                report.record_cancelled();
            }
        }
        for id in pending.drain_cancelled() {
            state.statuses.insert(id, FileStatus::Cancelled);
        }

        info!(
            patient = %state.patient.pid,
            merged = report.merged,
            rejected = report.total_rejected(),
            cancelled = report.cancelled,
            "Batch complete"
        );
        Ok(report)
    }

    /// Analyze the whole graph and store the result
    ///
    /// The analysis text and ICD-10 codes are saved with the graph record.
    /// Structured codes are used when the gateway returns any; otherwise codes
    /// are picked out of the free text.
    pub async fn analyze_graph(&mut self) -> Result<GraphAnalysis, SessionError> {
        let analysis = self
            .adapter
            .gateway()
            .analyze_graph(&self.state.graph)
            .await?;

        let codes = icd10::codes_for(&analysis);
        info!(
            patient = %self.state.patient.pid,
            codes = codes.len(),
            "Graph analysis received"
        );

        self.state.record.icd10_codes = codes;
        self.state.record.graph_analysis = Some(analysis.analysis.clone());
        self.state.persist_graph()?;
        Ok(analysis)
    }

    /// Analyze one node in the context of the whole graph
    pub async fn analyze_node(&self, node_id: &str) -> Result<String, SessionError> {
        let node = self
            .state
            .graph
            .node(node_id)
            .ok_or_else(|| SessionError::NotFound(format!("node {}", node_id)))?;
        Ok(self
            .adapter
            .gateway()
            .analyze_node(node, &self.state.graph)
            .await?)
    }

    /// Select a node
    pub fn select_node(&mut self, node_id: &str) -> Result<&GraphNode, SessionError> {
        let node = self
            .state
            .graph
            .node(node_id)
            .ok_or_else(|| SessionError::NotFound(format!("node {}", node_id)))?;
        self.state.selected = Some(node.id.clone());
        Ok(node)
    }

    /// Clear the selection
    pub fn clear_selection(&mut self) {
        self.state.selected = None;
    }

    /// The selected node, if any
    pub fn selected_node(&self) -> Option<&GraphNode> {
        self.state
            .selected
            .as_deref()
            .and_then(|id| self.state.graph.node(id))
    }

    /// Nodes and resolvable edges for display
    pub fn render_set(&self) -> RenderSet<'_> {
        RenderSet {
            nodes: &self.state.graph.nodes,
            edges: self.state.graph.resolved_edges().collect(),
            selected: self.state.selected.as_deref(),
        }
    }

    /// Delete the patient along with every stored upload, ending the session
    pub fn delete(mut self) -> Result<bool, SessionError> {
        let pid = self.state.patient.pid.clone();
        delete_patient(&mut self.state.store, &self.state.objects, &pid)
    }
}

/// Delete a patient's stored uploads, then the patient record
///
/// Files and the graph go with the patient row. An upload that cannot be
/// removed is logged and skipped.
pub fn delete_patient<S, O>(store: &mut S, objects: &O, pid: &PatientId) -> Result<bool, SessionError>
where
    S: PatientStore,
    S::Error: Display,
    O: ObjectStore,
    O::Error: Display,
{
    let files = store.list_files(pid).map_err(store_error)?;
    for file in &files {
        if let Err(e) = objects.remove(&file.storage_path) {
            warn!(path = %file.storage_path, error = %e, "Failed to remove stored upload");
        }
    }

    let deleted = store.delete_patient(pid).map_err(store_error)?;
    if deleted {
        info!(patient = %pid, files = files.len(), "Patient deleted");
    }
    Ok(deleted)
}
