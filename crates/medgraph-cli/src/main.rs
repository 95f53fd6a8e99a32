//! MedGraph CLI - Build and analyze patient knowledge graphs from medical documents.

use clap::Parser;
use medgraph_cli::commands;
use medgraph_cli::{Cli, Command, Config, Formatter};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> medgraph_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean; RUST_LOG overrides
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config, then apply flag and environment overrides
    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let mut config = match Config::load_from(&config_path) {
        Ok(config) => config,
        // A broken file must not block `config init --force`
        Err(e) if matches!(cli.command, Command::Config(_)) => {
            warn!("Ignoring unreadable config {}: {}", config_path.display(), e);
            Config::default()
        }
        Err(e) => return Err(e),
    };
    config.apply_overrides(cli.gateway_url, cli.api_key);

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Handle commands
    match cli.command {
        Command::Patient(args) => commands::execute_patient(args, &config, &formatter)?,
        Command::Upload(args) => commands::execute_upload(args, &config, &formatter).await?,
        Command::Graph(args) => commands::execute_graph(args, &config, &formatter)?,
        Command::Analyze(args) => commands::execute_analyze(args, &config, &formatter).await?,
        Command::Config(args) => {
            commands::execute_config(args, &config, &config_path, &formatter)?
        }
    }

    Ok(())
}
