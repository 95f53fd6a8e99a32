//! Batch processing report

use crate::error::SessionError;
use medgraph_domain::{FileId, MergeStats};
use medgraph_extractor::RejectionKind;
use std::collections::HashMap;

/// A storage write that failed while a batch was processed
#[derive(Debug)]
pub struct PersistenceFailure {
    /// File the write belonged to; `None` for graph upserts
    pub file: Option<FileId>,

    /// Always [`SessionError::Persistence`]
    pub error: SessionError,
}

/// What happened to one batch of pending files
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files whose fragment was merged
    pub merged: usize,

    /// Rejected files by kind
    pub rejected: HashMap<RejectionKind, usize>,

    /// Files cancelled before their result was applied
    pub cancelled: usize,

    /// Files left pending because extraction was disabled mid-batch
    pub skipped: usize,

    /// Storage writes that failed (uploads, file metadata, graph upserts)
    pub persistence_failures: Vec<PersistenceFailure>,

    /// Combined merge statistics
    pub stats: MergeStats,
}

impl BatchReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a merged fragment
    pub fn record_merged(&mut self, stats: MergeStats) {
        self.merged += 1;
        self.stats.absorb(stats);
    }

    /// Record a rejected file
    pub fn record_rejected(&mut self, kind: RejectionKind) {
        *self.rejected.entry(kind).or_insert(0) += 1;
    }

    /// Record a cancelled file
    pub fn record_cancelled(&mut self) {
        self.cancelled += 1;
    }

    /// Record a failed storage write
    pub fn record_persistence_failure(&mut self, file: Option<FileId>, detail: impl Into<String>) {
        self.persistence_failures.push(PersistenceFailure {
            file,
            error: SessionError::Persistence(detail.into()),
        });
    }

    /// Failed storage writes for one file
    pub fn persistence_failures_for(&self, file: FileId) -> impl Iterator<Item = &PersistenceFailure> {
        self.persistence_failures
            .iter()
            .filter(move |failure| failure.file == Some(file))
    }

    /// Whether nothing at all happened in this batch
    pub fn is_empty(&self) -> bool {
        self.total_processed() == 0 && self.skipped == 0 && self.persistence_failures.is_empty()
    }

    /// Rejections of one kind
    pub fn rejected_count(&self, kind: RejectionKind) -> usize {
        self.rejected.get(&kind).copied().unwrap_or(0)
    }

    /// All rejections
    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Files that reached a final state in this batch
    pub fn total_processed(&self) -> usize {
        self.merged + self.total_rejected() + self.cancelled
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Batch Report".to_string(),
            "============".to_string(),
            format!("Merged: {}", self.merged),
            format!(
                "  nodes: +{} ({} duplicate)",
                self.stats.nodes_admitted, self.stats.nodes_duplicate
            ),
            format!(
                "  edges: +{} ({} duplicate)",
                self.stats.edges_admitted, self.stats.edges_duplicate
            ),
            format!("Rejected: {}", self.total_rejected()),
        ];

        for kind in RejectionKind::ALL {
            let count = self.rejected_count(kind);
            if count > 0 {
                lines.push(format!("  {}: {}", kind, count));
            }
        }

        lines.push(format!("Cancelled: {}", self.cancelled));
        if self.skipped > 0 {
            lines.push(format!("Skipped (extraction disabled): {}", self.skipped));
        }
        if !self.persistence_failures.is_empty() {
            lines.push(format!("Persistence failures: {}", self.persistence_failures.len()));
            for failure in &self.persistence_failures {
                match failure.file {
                    Some(id) => lines.push(format!("  file {}: {}", id, failure.error)),
                    None => lines.push(format!("  graph: {}", failure.error)),
                }
            }
        }

        lines.join("\n")
    }
}
