//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MedGraph CLI - Build and analyze patient knowledge graphs from medical documents.
#[derive(Debug, Parser)]
#[command(name = "medgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Gateway base URL (overrides the config file)
    #[arg(long, env = "MEDGRAPH_GATEWAY_URL", global = true)]
    pub gateway_url: Option<String>,

    /// Gateway API key (overrides the config file)
    #[arg(long, env = "MEDGRAPH_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (identifiers only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage patients
    Patient(PatientArgs),

    /// Upload files for a patient and merge them into the graph
    Upload(UploadArgs),

    /// Show a patient's knowledge graph
    Graph(GraphArgs),

    /// Analyze a patient's graph, or one node in it
    Analyze(AnalyzeArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for patient management.
#[derive(Debug, Parser)]
pub struct PatientArgs {
    #[command(subcommand)]
    pub action: PatientAction,
}

/// Patient management actions.
#[derive(Debug, Subcommand)]
pub enum PatientAction {
    /// Register a new patient
    Create {
        /// Full name
        name: String,
        /// Age in years
        age: u32,
    },

    /// List patients, newest first
    List,

    /// Show a patient with files and graph summary
    Show {
        /// Patient identifier (e.g. ANA340042)
        pid: String,
    },

    /// Delete a patient, their files and their graph
    Delete {
        /// Patient identifier
        pid: String,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Arguments for the upload command.
#[derive(Debug, Parser)]
pub struct UploadArgs {
    /// Patient identifier
    pub pid: String,

    /// Files to upload, processed in the order given
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// MIME type for every file (guessed from the extension otherwise)
    #[arg(short, long)]
    pub mime: Option<String>,

    /// Maximum extraction calls in flight
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,
}

/// Arguments for the graph command.
#[derive(Debug, Parser)]
pub struct GraphArgs {
    /// Patient identifier
    pub pid: String,

    /// Show only edges, not nodes
    #[arg(long)]
    pub edges: bool,
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Patient identifier
    pub pid: String,

    /// Analyze a single node instead of the whole graph
    #[arg(short, long)]
    pub node: Option<String>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
