//! MedGraph LLM Gateway Layer
//!
//! Client side of the third-party gateway that classifies, extracts and
//! analyzes medical documents.
//!
//! # Architecture
//!
//! The [`KnowledgeGateway`] trait is the narrow seam the extractor and the
//! session depend on. Two implementations are provided:
//!
//! - `MockGateway`: Deterministic, configurable mock for testing
//! - `HttpGateway`: `reqwest` client for the hosted gateway endpoints
//!
//! # Examples
//!
//! ```
//! use medgraph_domain::SourceFile;
//! use medgraph_llm::{KnowledgeGateway, MockGateway};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let gateway = MockGateway::new(r#"{"nodes": [], "edges": []}"#);
//! let file = SourceFile::new("labs.txt", "text/plain", "HbA1c 6.1%");
//! let body = rt.block_on(gateway.extract_knowledge(&file)).unwrap();
//! assert!(body.contains("nodes"));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod http;
pub mod types;

use medgraph_domain::{GraphNode, KnowledgeGraph, SourceFile};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use config::GatewayConfig;
pub use http::{map_error_status, HttpGateway};
pub use types::{GraphAnalysis, StructuredAnalysis};

/// Errors that can occur during gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The gateway classified the document as non-medical (400, `isMedical: false`)
    #[error("Not a medical document: {0}")]
    NotMedical(String),

    /// The gateway refused the request (400 without a classification flag)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Account credits exhausted (402)
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Any other non-success status
    #[error("Gateway returned HTTP {status}: {message}")]
    Service {
        /// HTTP status code
        status: u16,
        /// Error message from the body, or the raw body
        message: String,
    },

    /// Network or transport error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Client for the document extraction and analysis gateway
///
/// Calls are issued from the single task that owns the patient session, so
/// the returned futures are not required to be `Send`.
#[allow(async_fn_in_trait)]
pub trait KnowledgeGateway {
    /// Classify and extract a file; returns the raw 200 body
    async fn extract_knowledge(&self, file: &SourceFile) -> Result<String, GatewayError>;

    /// Analyze one node in the context of the whole graph
    async fn analyze_node(
        &self,
        node: &GraphNode,
        graph: &KnowledgeGraph,
    ) -> Result<String, GatewayError>;

    /// Analyze the whole graph
    async fn analyze_graph(&self, graph: &KnowledgeGraph) -> Result<GraphAnalysis, GatewayError>;

    /// Short name for logging
    fn name(&self) -> &str;
}

/// Mock gateway for deterministic testing
///
/// Extraction replies are keyed by file name; unknown files get the default
/// body. Clones share their call log.
///
/// # Examples
///
/// ```
/// use medgraph_llm::{GatewayError, MockGateway};
///
/// let gateway = MockGateway::new(r#"{"nodes": [], "edges": []}"#)
///     .with_response("labs.pdf", r#"{"nodes": [{"id": "a", "label": "A", "type": "symptom"}], "edges": []}"#)
///     .with_error("cat.jpg", GatewayError::NotMedical("a cat".to_string()));
/// assert_eq!(gateway.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockGateway {
    default_response: String,
    responses: HashMap<String, Result<String, GatewayError>>,
    delays: HashMap<String, Duration>,
    node_analysis: String,
    graph_analysis: Result<GraphAnalysis, GatewayError>,
    call_count: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockGateway {
    /// Create a mock returning `response` for every extraction
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: HashMap::new(),
            delays: HashMap::new(),
            node_analysis: "No notable findings.".to_string(),
            graph_analysis: Ok(GraphAnalysis::default()),
            call_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Return `body` when `file_name` is extracted
    pub fn with_response(mut self, file_name: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(file_name.into(), Ok(body.into()));
        self
    }

    /// Fail with `error` when `file_name` is extracted
    pub fn with_error(mut self, file_name: impl Into<String>, error: GatewayError) -> Self {
        self.responses.insert(file_name.into(), Err(error));
        self
    }

    /// Delay the reply for `file_name`
    pub fn with_delay(mut self, file_name: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(file_name.into(), delay);
        self
    }

    /// Set the text returned by node analysis
    pub fn with_node_analysis(mut self, analysis: impl Into<String>) -> Self {
        self.node_analysis = analysis.into();
        self
    }

    /// Set the result of graph analysis
    pub fn with_graph_analysis(mut self, result: Result<GraphAnalysis, GatewayError>) -> Self {
        self.graph_analysis = result;
        self
    }

    /// Number of gateway calls made (all endpoints)
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// File names passed to extraction, in call order
    pub fn extracted_files(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn record(&self, file_name: &str) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.calls.lock() {
            Ok(mut calls) => calls.push(file_name.to_string()),
            Err(poisoned) => poisoned.into_inner().push(file_name.to_string()),
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new(r#"{"nodes": [], "edges": []}"#)
    }
}

impl KnowledgeGateway for MockGateway {
    async fn extract_knowledge(&self, file: &SourceFile) -> Result<String, GatewayError> {
        self.record(&file.file_name);

        if let Some(delay) = self.delays.get(&file.file_name) {
            tokio::time::sleep(*delay).await;
        }

        match self.responses.get(&file.file_name) {
            Some(reply) => reply.clone(),
            None => Ok(self.default_response.clone()),
        }
    }

    async fn analyze_node(
        &self,
        _node: &GraphNode,
        _graph: &KnowledgeGraph,
    ) -> Result<String, GatewayError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.node_analysis.clone())
    }

    async fn analyze_graph(&self, _graph: &KnowledgeGraph) -> Result<GraphAnalysis, GatewayError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.graph_analysis.clone()
    }

    fn name(&self) -> &str {
        "mock"
    }
}
