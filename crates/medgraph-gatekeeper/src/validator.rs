//! File intake validation

use crate::{GatekeeperError, IntakeConfig};
use medgraph_domain::SourceFile;
use std::fmt;
use tracing::debug;

/// Result of file validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the file passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (if any)
    pub reasons: Vec<RejectionReason>,
}

impl ValidationResult {
    /// Whether the file was accepted
    pub fn is_accepted(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }

    /// All reasons joined into one message
    pub fn message(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// File accepted
    Accepted,

    /// File rejected
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// The file has no content
    Empty,

    /// The file exceeds the size limit
    TooLarge {
        /// Actual size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// The MIME type is not on the allowlist
    UnsupportedMimeType(String),

    /// The file name is blank or carries path components
    InvalidFileName(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Empty => write!(f, "file is empty"),
            RejectionReason::TooLarge { size, limit } => {
                write!(f, "file is {} bytes, limit is {} bytes", size, limit)
            }
            RejectionReason::UnsupportedMimeType(mime) => {
                write!(f, "unsupported file type '{}'", mime)
            }
            RejectionReason::InvalidFileName(name) => write!(f, "invalid file name '{}'", name),
        }
    }
}

/// The intake gate checks files before extraction
#[derive(Debug, Clone, Default)]
pub struct IntakeGate {
    config: IntakeConfig,
}

impl IntakeGate {
    /// Create a gate with the given configuration
    pub fn new(config: IntakeConfig) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(Self { config })
    }

    /// The active configuration
    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Validate a file against the configured rules
    ///
    /// Every failing rule contributes a reason.
    pub fn validate(&self, file: &SourceFile) -> ValidationResult {
        let mut reasons = Vec::new();

        if let Some(reason) = self.validate_file_name(&file.file_name) {
            reasons.push(reason);
        }

        if file.bytes.is_empty() {
            reasons.push(RejectionReason::Empty);
        } else if file.size() > self.config.max_file_bytes {
            reasons.push(RejectionReason::TooLarge {
                size: file.size(),
                limit: self.config.max_file_bytes,
            });
        }

        if self.config.check_mime_type && !self.config.allows(&file.mime_type) {
            reasons.push(RejectionReason::UnsupportedMimeType(file.mime_type.clone()));
        }

        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            debug!(file = %file.file_name, reasons = reasons.len(), "Intake gate rejected file");
            ValidationStatus::Rejected
        };

        ValidationResult { status, reasons }
    }

    fn validate_file_name(&self, name: &str) -> Option<RejectionReason> {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains('/')
            || trimmed.contains('\\')
            || trimmed.contains('\0')
        {
            return Some(RejectionReason::InvalidFileName(name.to_string()));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(bytes: usize) -> SourceFile {
        SourceFile::new("report.pdf", "application/pdf", vec![b'x'; bytes])
    }

    #[test]
    fn test_valid_file() {
        let gate = IntakeGate::default();
        let result = gate.validate(&pdf(128));

        assert_eq!(result.status, ValidationStatus::Accepted);
        assert!(result.reasons.is_empty());
        assert!(result.is_accepted());
    }

    #[test]
    fn test_empty_file() {
        let gate = IntakeGate::default();
        let result = gate.validate(&pdf(0));

        assert_eq!(result.status, ValidationStatus::Rejected);
        assert_eq!(result.reasons, vec![RejectionReason::Empty]);
    }

    #[test]
    fn test_too_large() {
        let config = IntakeConfig {
            max_file_bytes: 10,
            ..IntakeConfig::default()
        };
        let gate = IntakeGate::new(config).unwrap();

        let result = gate.validate(&pdf(11));
        match &result.reasons[0] {
            RejectionReason::TooLarge { size, limit } => {
                assert_eq!(*size, 11);
                assert_eq!(*limit, 10);
            }
            other => panic!("Expected TooLarge, got {:?}", other),
        }

        assert!(gate.validate(&pdf(10)).is_accepted());
    }

    #[test]
    fn test_unsupported_mime_type() {
        let gate = IntakeGate::default();
        let file = SourceFile::new("song.mp3", "audio/mpeg", vec![1u8, 2, 3]);

        let result = gate.validate(&file);
        assert_eq!(
            result.reasons,
            vec![RejectionReason::UnsupportedMimeType("audio/mpeg".to_string())]
        );
        assert!(result.message().contains("audio/mpeg"));
    }

    #[test]
    fn test_permissive_skips_mime_check() {
        let gate = IntakeGate::new(IntakeConfig::permissive()).unwrap();
        let file = SourceFile::new("song.mp3", "audio/mpeg", vec![1u8, 2, 3]);
        assert!(gate.validate(&file).is_accepted());
    }

    #[test]
    fn test_invalid_file_names() {
        let gate = IntakeGate::default();
        for name in ["", "  ", "..", "../etc/passwd", "a\\b.txt"] {
            let file = SourceFile::new(name, "text/plain", "x");
            let result = gate.validate(&file);
            assert!(
                matches!(result.reasons[0], RejectionReason::InvalidFileName(_)),
                "name {:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_multiple_reasons_collected() {
        let gate = IntakeGate::default();
        let file = SourceFile::new("", "audio/mpeg", Vec::<u8>::new());

        let result = gate.validate(&file);
        assert_eq!(result.reasons.len(), 3);
        assert_eq!(result.message().matches("; ").count(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = IntakeConfig {
            max_file_bytes: 0,
            ..IntakeConfig::default()
        };
        assert!(matches!(
            IntakeGate::new(config),
            Err(GatekeeperError::Config(_))
        ));
    }
}
