//! Core extraction adapter

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::{parse_extraction_response, ParsedResponse};
use crate::types::{ExtractionOutcome, RejectionKind};
use medgraph_domain::SourceFile;
use medgraph_gatekeeper::IntakeGate;
use medgraph_llm::{GatewayError, KnowledgeGateway};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Turns one uploaded file into a fragment or a rejection
///
/// The adapter persists nothing and never touches the accumulated graph.
pub struct ExtractionAdapter<G>
where
    G: KnowledgeGateway,
{
    gateway: G,
    gate: IntakeGate,
    config: ExtractorConfig,
}

impl<G> ExtractionAdapter<G>
where
    G: KnowledgeGateway,
{
    /// Create a new adapter
    pub fn new(gateway: G, gate: IntakeGate, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            gateway,
            gate,
            config,
        })
    }

    /// The underlying gateway
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a fragment from one file
    ///
    /// Never fails: every problem is reported as a rejected outcome.
    pub async fn extract(&self, file: &SourceFile) -> ExtractionOutcome {
        let validation = self.gate.validate(file);
        if !validation.is_accepted() {
            let reason = validation.message();
            info!(file = %file.file_name, %reason, "File refused at intake");
            return ExtractionOutcome::rejected(RejectionKind::ContentRejected, reason);
        }

        debug!(
            file = %file.file_name,
            gateway = self.gateway.name(),
            "Calling extraction gateway"
        );

        let response = timeout(
            self.config.extraction_timeout(),
            self.gateway.extract_knowledge(file),
        )
        .await
        .unwrap_or(Err(GatewayError::Timeout));

        let body = match response {
            Ok(body) => body,
            Err(e) => {
                let kind = RejectionKind::from(&e);
                warn!(file = %file.file_name, %kind, error = %e, "Extraction rejected");
                return ExtractionOutcome::rejected(kind, e.to_string());
            }
        };

        match parse_extraction_response(&body) {
            ParsedResponse::NotMedical(reason) => {
                info!(file = %file.file_name, %reason, "Gateway classified file as non-medical");
                ExtractionOutcome::rejected(RejectionKind::ContentRejected, reason)
            }
            ParsedResponse::Fragment(parsed) => {
                info!(
                    file = %file.file_name,
                    nodes = parsed.fragment.nodes.len(),
                    edges = parsed.fragment.edges.len(),
                    skipped_nodes = parsed.skipped_nodes,
                    skipped_edges = parsed.skipped_edges,
                    "Extraction complete"
                );
                ExtractionOutcome::Fragment(parsed.fragment)
            }
        }
    }
}
