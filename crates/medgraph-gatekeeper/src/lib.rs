//! MedGraph Gatekeeper
//!
//! Intake checks applied to an uploaded file before any gateway call.
//!
//! The gate provides:
//! - Empty file and size limit checks
//! - File name sanity checks
//! - MIME type allowlisting (with `type/*` wildcards)
//!
//! A file the gate rejects never reaches the gateway.
//!
//! # Examples
//!
//! ```
//! use medgraph_domain::SourceFile;
//! use medgraph_gatekeeper::{IntakeConfig, IntakeGate, ValidationStatus};
//!
//! let gate = IntakeGate::new(IntakeConfig::default()).unwrap();
//!
//! let file = SourceFile::new("discharge.pdf", "application/pdf", b"%PDF-1.7".to_vec());
//! assert_eq!(gate.validate(&file).status, ValidationStatus::Accepted);
//!
//! let empty = SourceFile::new("blank.txt", "text/plain", Vec::<u8>::new());
//! assert_eq!(gate.validate(&empty).status, ValidationStatus::Rejected);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::IntakeConfig;
pub use error::GatekeeperError;
pub use validator::{IntakeGate, RejectionReason, ValidationResult, ValidationStatus};
