//! MedGraph Extractor
//!
//! Converts one uploaded medical file into a graph fragment.
//!
//! # Overview
//!
//! The extraction adapter is the only pathway from raw uploads to graph
//! fragments. It runs the intake gate, calls the gateway (which performs the
//! medical classification before extracting), and parses the result
//! leniently.
//!
//! # Architecture
//!
//! ```text
//! File → IntakeGate → Gateway (classify + extract) → Parser → Fragment | Rejected
//! ```
//!
//! Fragments go to the accumulator; rejections never do.
//!
//! # Example Usage
//!
//! ```no_run
//! use medgraph_domain::SourceFile;
//! use medgraph_extractor::{ExtractionAdapter, ExtractionOutcome, ExtractorConfig};
//! use medgraph_gatekeeper::IntakeGate;
//! use medgraph_llm::MockGateway;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let adapter = ExtractionAdapter::new(
//!     MockGateway::default(),
//!     IntakeGate::default(),
//!     ExtractorConfig::default(),
//! )?;
//!
//! let file = SourceFile::new("labs.pdf", "application/pdf", std::fs::read("labs.pdf")?);
//! match adapter.extract(&file).await {
//!     ExtractionOutcome::Fragment(fragment) => println!("{} nodes", fragment.nodes.len()),
//!     ExtractionOutcome::Rejected { kind, reason } => println!("{}: {}", kind, reason),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod types;


pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::ExtractionAdapter;
pub use parser::{parse_extraction_response, ParsedFragment, ParsedResponse};
pub use types::{ExtractionOutcome, RejectionKind};
