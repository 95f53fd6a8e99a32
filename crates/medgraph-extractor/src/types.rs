//! Extraction outcomes and rejection kinds

use medgraph_domain::Fragment;
use medgraph_llm::GatewayError;
use std::fmt;

/// Why a file produced no fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectionKind {
    /// Not medical, ambiguous classification, or refused by the intake gate
    ContentRejected,

    /// Gateway rate limit (429)
    RateLimited,

    /// Gateway credits exhausted (402)
    QuotaExhausted,

    /// Network error, timeout, 5xx, or an undecodable response
    TransientFailure,
}

impl RejectionKind {
    /// All kinds, in report order
    pub const ALL: [RejectionKind; 4] = [
        RejectionKind::ContentRejected,
        RejectionKind::RateLimited,
        RejectionKind::QuotaExhausted,
        RejectionKind::TransientFailure,
    ];

    /// Whether resubmitting the same file later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RejectionKind::RateLimited | RejectionKind::TransientFailure
        )
    }

    /// Whether no further extraction should be attempted this session
    pub fn is_fatal(&self) -> bool {
        matches!(self, RejectionKind::QuotaExhausted)
    }

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::ContentRejected => "content_rejected",
            RejectionKind::RateLimited => "rate_limited",
            RejectionKind::QuotaExhausted => "quota_exhausted",
            RejectionKind::TransientFailure => "transient_failure",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&GatewayError> for RejectionKind {
    fn from(error: &GatewayError) -> Self {
        match error {
            GatewayError::NotMedical(_) | GatewayError::BadRequest(_) => {
                RejectionKind::ContentRejected
            }
            GatewayError::RateLimited(_) => RejectionKind::RateLimited,
            GatewayError::QuotaExhausted(_) => RejectionKind::QuotaExhausted,
            GatewayError::Service { .. }
            | GatewayError::Communication(_)
            | GatewayError::Timeout
            | GatewayError::InvalidResponse(_)
            | GatewayError::Configuration(_) => RejectionKind::TransientFailure,
        }
    }
}

/// Result of extracting one file
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// The file was classified medical and parsed
    Fragment(Fragment),

    /// The file produced nothing to merge
    Rejected {
        /// Category of the rejection
        kind: RejectionKind,
        /// Human-readable reason
        reason: String,
    },
}

impl ExtractionOutcome {
    /// Build a rejected outcome
    pub fn rejected(kind: RejectionKind, reason: impl Into<String>) -> Self {
        ExtractionOutcome::Rejected {
            kind,
            reason: reason.into(),
        }
    }

    /// The rejection kind, if rejected
    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        match self {
            ExtractionOutcome::Fragment(_) => None,
            ExtractionOutcome::Rejected { kind, .. } => Some(*kind),
        }
    }

    /// The fragment, if extraction succeeded
    pub fn fragment(&self) -> Option<&Fragment> {
        match self {
            ExtractionOutcome::Fragment(fragment) => Some(fragment),
            ExtractionOutcome::Rejected { .. } => None,
        }
    }
}
