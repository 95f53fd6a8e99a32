//! Upload command implementation.

use super::{open_session, parse_pid};
use crate::cli::UploadArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{Formatter, UploadLine};
use medgraph_domain::{FileId, SourceFile};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Execute the upload command.
///
/// Files are queued in the order given and processed as one batch. Ctrl+C
/// cancels whatever has not been merged yet.
pub async fn execute_upload(args: UploadArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let pid = parse_pid(&args.pid)?;

    let mut config = config.clone();
    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            return Err(CliError::InvalidInput("--jobs must be at least 1".to_string()));
        }
        config.extractor.max_concurrent_extractions = jobs;
    }

    let files = args
        .files
        .iter()
        .map(|path| read_source_file(path, args.mime.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    let mut session = open_session(&config, &pid)?;
    let queued: Vec<(String, FileId)> = files
        .into_iter()
        .map(|file| {
            let name = file.file_name.clone();
            (name, session.enqueue(file))
        })
        .collect();

    let handle = session.cancel_handle();
    let report = {
        let process = session.process_pending();
        tokio::pin!(process);

        tokio::select! {
            report = &mut process => report?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted; cancelling files not yet merged");
                for (_, id) in &queued {
                    handle.cancel(*id);
                }
                process.await?
            }
        }
    };

    let lines: Vec<UploadLine> = queued
        .into_iter()
        .map(|(name, id)| UploadLine {
            name,
            id,
            status: session.file_status(id),
        })
        .collect();
    println!("{}", formatter.format_report(&report, &lines)?);

    if session.is_extraction_disabled() {
        eprintln!(
            "{}",
            formatter.warning("Account quota exhausted; remaining files were not processed")
        );
    }
    Ok(())
}

/// Read a file from disk as an upload.
fn read_source_file(path: &Path, mime: Option<&str>) -> Result<SourceFile> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidInput(format!("Not a file: {}", path.display())))?;
    let mime = mime.map(str::to_string).unwrap_or_else(|| guess_mime(path).to_string());
    Ok(SourceFile::new(name, mime, bytes))
}

/// MIME type from a file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}
