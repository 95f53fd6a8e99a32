//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
///
/// `path` is the file in use: the `--config` argument or the default location.
pub fn execute_config(
    args: ConfigArgs,
    config: &Config,
    path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(config, formatter),
        ConfigAction::Init { force } => init_config(path, force, formatter),
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Print the effective configuration with the API key masked.
fn show_config(config: &Config, formatter: &Formatter) -> Result<()> {
    let mut shown = config.clone();
    if shown.gateway.api_key.is_some() {
        shown.gateway.api_key = Some("********".to_string());
    }

    match formatter.format() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        _ => print!("{}", shown.to_toml()?),
    }
    Ok(())
}

/// Write a default configuration file.
fn init_config(path: &Path, force: bool, formatter: &Formatter) -> Result<()> {
    if path.exists() && !force {
        println!(
            "{}",
            formatter.warning(&format!(
                "{} already exists; use --force to overwrite",
                path.display()
            ))
        );
        return Ok(());
    }

    Config::default().save_to(path)?;
    println!(
        "{}",
        formatter.success(&format!("Wrote default configuration to {}", path.display()))
    );
    Ok(())
}
