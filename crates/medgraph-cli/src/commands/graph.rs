//! Graph command implementation.

use super::{open_store, parse_pid};
use crate::cli::GraphArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use medgraph_domain::traits::PatientStore;
use medgraph_session::RenderSet;

/// Execute the graph command.
///
/// Reads the stored graph directly; no gateway connection is needed.
pub fn execute_graph(args: GraphArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let pid = parse_pid(&args.pid)?;
    let store = open_store(config)?;

    if store.get_patient(&pid)?.is_none() {
        return Err(CliError::PatientNotFound(pid.to_string()));
    }

    let graph = store
        .load_graph(&pid)?
        .map(|record| record.graph())
        .unwrap_or_default();

    let render = RenderSet {
        nodes: &graph.nodes,
        edges: graph.resolved_edges().collect(),
        selected: None,
    };
    println!("{}", formatter.format_graph(&render, args.edges)?);
    Ok(())
}
