//! Analyze command implementation.

use super::{open_session, parse_pid};
use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the analyze command.
pub async fn execute_analyze(args: AnalyzeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let pid = parse_pid(&args.pid)?;
    let mut session = open_session(config, &pid)?;

    if session.graph().is_empty() {
        return Err(CliError::InvalidInput(format!(
            "Patient {} has no graph yet; upload files first",
            pid
        )));
    }

    match args.node {
        Some(node_id) => {
            let node = session.select_node(&node_id)?.clone();
            let analysis = session.analyze_node(&node.id).await?;
            println!("{}", formatter.format_node_analysis(&node, &analysis)?);
        }
        None => {
            let analysis = session.analyze_graph().await?;
            let codes = &session.record().icd10_codes;
            println!("{}", formatter.format_analysis(&analysis, codes)?);
        }
    }
    Ok(())
}
