//! HTTP Gateway Implementation
//!
//! Talks to the hosted gateway functions over HTTPS.
//!
//! # Endpoints
//!
//! - `POST {base}/extract-knowledge`: multipart upload, field `file`
//! - `POST {base}/analyze-node`: JSON `{node, allNodes, allEdges}`
//! - `POST {base}/analyze-graph`: JSON `{nodes, edges}`
//!
//! Non-2xx statuses are mapped by [`map_error_status`]. Nothing is retried
//! here; a 429 is surfaced to the caller.
//!
//! # Examples
//!
//! ```no_run
//! use medgraph_llm::{GatewayConfig, HttpGateway};
//!
//! let config = GatewayConfig::new("https://gateway.example/functions/v1")
//!     .with_api_key("secret");
//! let gateway = HttpGateway::new(config).unwrap();
//! ```

use crate::config::GatewayConfig;
use crate::types::{AnalyzeGraphRequest, AnalyzeNodeRequest, AnalyzeNodeResponse, ErrorBody};
use crate::{GatewayError, GraphAnalysis, KnowledgeGateway};
use medgraph_domain::{GraphNode, KnowledgeGraph, SourceFile};
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

/// Extraction endpoint path
pub const EXTRACT_PATH: &str = "extract-knowledge";

/// Node analysis endpoint path
pub const ANALYZE_NODE_PATH: &str = "analyze-node";

/// Graph analysis endpoint path
pub const ANALYZE_GRAPH_PATH: &str = "analyze-graph";

/// Map a non-success HTTP status and its body to a gateway error
///
/// A 400 is a classification outcome: `isMedical: false` in the body means
/// the document is not medical, anything else is a plain refusal.
pub fn map_error_status(status: u16, body: &str) -> GatewayError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error
        .unwrap_or_else(|| body.trim().chars().take(200).collect());

    match status {
        400 if parsed.is_medical == Some(false) => GatewayError::NotMedical(message),
        400 => GatewayError::BadRequest(message),
        402 => GatewayError::QuotaExhausted(message),
        429 => GatewayError::RateLimited(message),
        _ => GatewayError::Service { status, message },
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Communication(format!("Request failed: {}", e))
    }
}

/// Gateway client backed by `reqwest`
pub struct HttpGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl HttpGateway {
    /// Create a client from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Configuration` if the configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        config.validate().map_err(GatewayError::Configuration)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(self.config.endpoint(path));
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, GatewayError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if status.is_success() {
            Ok(body)
        } else {
            let error = map_error_status(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %error, "Gateway call failed");
            Err(error)
        }
    }
}

impl KnowledgeGateway for HttpGateway {
    async fn extract_knowledge(&self, file: &SourceFile) -> Result<String, GatewayError> {
        debug!(
            file = %file.file_name,
            mime = %file.mime_type,
            bytes = file.size(),
            "Requesting extraction"
        );

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| {
                GatewayError::BadRequest(format!("Invalid MIME type '{}': {}", file.mime_type, e))
            })?;
        let form = Form::new().part("file", part);

        self.send(self.post(EXTRACT_PATH).multipart(form)).await
    }

    async fn analyze_node(
        &self,
        node: &GraphNode,
        graph: &KnowledgeGraph,
    ) -> Result<String, GatewayError> {
        let request = AnalyzeNodeRequest {
            node,
            all_nodes: &graph.nodes,
            all_edges: &graph.edges,
        };

        let body = self.send(self.post(ANALYZE_NODE_PATH).json(&request)).await?;
        serde_json::from_str::<AnalyzeNodeResponse>(&body)
            .map(|r| r.analysis)
            .map_err(|e| GatewayError::InvalidResponse(format!("analyze-node: {}", e)))
    }

    async fn analyze_graph(&self, graph: &KnowledgeGraph) -> Result<GraphAnalysis, GatewayError> {
        let request = AnalyzeGraphRequest {
            nodes: &graph.nodes,
            edges: &graph.edges,
        };

        let body = self.send(self.post(ANALYZE_GRAPH_PATH).json(&request)).await?;
        serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("analyze-graph: {}", e)))
    }

    fn name(&self) -> &str {
        "http"
    }
}
