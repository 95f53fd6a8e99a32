//! Patient command implementation.

use super::{open_objects, open_store, parse_pid};
use crate::cli::{PatientAction, PatientArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use medgraph_domain::traits::PatientStore;
use medgraph_store::now_secs;
use std::io::{self, Write};

/// Execute the patient command.
pub fn execute_patient(args: PatientArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    match args.action {
        PatientAction::Create { name, age } => create_patient(config, &name, age, formatter),
        PatientAction::List => list_patients(config, formatter),
        PatientAction::Show { pid } => show_patient(config, &pid, formatter),
        PatientAction::Delete { pid, yes } => delete_patient(config, &pid, yes, formatter),
    }
}

/// Register a patient with a generated PID.
fn create_patient(config: &Config, name: &str, age: u32, formatter: &Formatter) -> Result<()> {
    if age > 150 {
        return Err(CliError::InvalidInput(format!("Age {} is out of range", age)));
    }

    let mut store = open_store(config)?;
    let patient = store.register_patient(name, age, now_secs())?;

    match formatter.format() {
        crate::config::OutputFormat::Table => {
            println!(
                "{}",
                formatter.success(&format!("Patient registered: {} ({})", patient.pid, patient.name))
            );
        }
        _ => println!("{}", formatter.format_patient(&patient, &[], None)?),
    }
    Ok(())
}

/// List all patients.
fn list_patients(config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;
    let patients = store.list_patients()?;
    println!("{}", formatter.format_patients(&patients)?);
    Ok(())
}

/// Show one patient with files and graph summary.
fn show_patient(config: &Config, pid: &str, formatter: &Formatter) -> Result<()> {
    let pid = parse_pid(pid)?;
    let store = open_store(config)?;

    let patient = store
        .get_patient(&pid)?
        .ok_or_else(|| CliError::PatientNotFound(pid.to_string()))?;
    let files = store.list_files(&pid)?;
    let record = store.load_graph(&pid)?;

    println!("{}", formatter.format_patient(&patient, &files, record.as_ref())?);
    Ok(())
}

/// Delete a patient and everything stored for them.
fn delete_patient(config: &Config, pid: &str, yes: bool, formatter: &Formatter) -> Result<()> {
    let pid = parse_pid(pid)?;
    let mut store = open_store(config)?;

    let patient = store
        .get_patient(&pid)?
        .ok_or_else(|| CliError::PatientNotFound(pid.to_string()))?;

    // Confirm deletion unless --yes is specified
    if !yes {
        let files = store.list_files(&pid)?;
        println!(
            "About to delete {} ({}) with {} file(s) and their graph.",
            patient.pid,
            patient.name,
            files.len()
        );
        print!("Continue? [y/N] ");
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;

        if !response.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.info("Operation cancelled"));
            return Ok(());
        }
    }

    let objects = open_objects(config)?;
    if medgraph_session::delete_patient(&mut store, &objects, &pid)? {
        println!("{}", formatter.success(&format!("Deleted patient {}", pid)));
    } else {
        println!("{}", formatter.warning(&format!("Patient {} was already gone", pid)));
    }
    Ok(())
}
