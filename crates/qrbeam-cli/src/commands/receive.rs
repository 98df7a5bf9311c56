//! Receive command implementation.
//!
//! Reads decoded QR payloads one per line, as produced by a scanner app or
//! a decoding pipeline, and rebuilds the file once every code was seen.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;

use qrbeam_core::config::parse_duration;
use qrbeam_core::file::{self, format_size};
use qrbeam_core::scan::{ScanDebouncer, ScanStats};
use qrbeam_core::session::{IngestEvent, IngestOutcome, ReceiveSession};

use super::ReceiveArgs;
use crate::ui::{format_elapsed, format_missing, progress_bar};

const MISSING_SHOWN: usize = 12;
const MISSING_LISTED_JSON: usize = 1024;

/// Run the receive command.
pub async fn run(args: ReceiveArgs) -> Result<()> {
    let global_config = super::load_config();

    let output_dir = args
        .output
        .clone()
        .or_else(|| global_config.receive.default_output.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let window = match args.debounce.as_deref() {
        Some(s) => parse_duration(s)
            .with_context(|| format!("Invalid debounce window '{}', expected e.g. 500ms", s))?,
        None => global_config.receive.debounce_window,
    };

    let reader: Box<dyn AsyncRead + Unpin + Send> = if args.input == "-" {
        Box::new(tokio::io::stdin())
    } else {
        let file = tokio::fs::File::open(&args.input)
            .await
            .with_context(|| format!("Failed to open {}", args.input))?;
        Box::new(file)
    };

    if !args.quiet && !args.json {
        println!();
        println!("qrbeam v{}", qrbeam_core::VERSION);
        println!("{}", "-".repeat(37));
        println!();
        println!("  Waiting for scanned codes...");
        println!();
    }

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let mut session = ReceiveSession::new();
    let mut debouncer = ScanDebouncer::new(window);
    let mut stats = ScanStats::start();
    let mut lines = BufReader::new(reader).lines();

    let completed = loop {
        let line = tokio::select! {
            biased;
            () = token.cancelled() => break false,
            line = lines.next_line() => line.context("Failed to read scanned codes")?,
        };

        let Some(line) = line else {
            break false;
        };
        let payload = line.trim();
        if payload.is_empty() || !debouncer.accept(payload) {
            continue;
        }
        stats.record_scan();

        let outcome = session.ingest(payload);
        report_outcome(&session, &outcome, &args);

        if outcome.completed() {
            break true;
        }
    };

    token.cancel();

    if completed {
        let path = save_file(&session, &output_dir).await?;
        report_saved(&session, &path, &stats, &args)?;
        return Ok(());
    }

    report_incomplete(&session, &args)?;
    if session.metadata().is_none() {
        bail!("No qrbeam codes were received");
    }
    bail!(
        "Transfer incomplete: {} of {} codes missing",
        session.missing_count(),
        session.total_chunks()
    );
}

async fn save_file(session: &ReceiveSession, output_dir: &Path) -> Result<PathBuf> {
    let metadata = session
        .metadata()
        .context("Transfer finished without metadata")?;
    let bytes = session.assemble()?;

    if bytes.len() as u64 != metadata.file_size {
        tracing::warn!(
            expected = metadata.file_size,
            actual = bytes.len(),
            "Received size differs from announced size"
        );
    }

    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let path = file::output_path(output_dir, &metadata.output_file_name());
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(session = %session.id(), path = %path.display(), "Saved received file");
    Ok(path)
}

fn report_outcome(session: &ReceiveSession, outcome: &IngestOutcome, args: &ReceiveArgs) {
    if args.json {
        for event in &outcome.events {
            println!("{}", event_json(session, event));
        }
        return;
    }
    if args.quiet {
        return;
    }

    for line in outcome_lines(session, outcome) {
        println!("{}", line);
    }
}

/// Text notices for one ingest outcome, in display order.
fn outcome_lines(session: &ReceiveSession, outcome: &IngestOutcome) -> Vec<String> {
    let mut lines = Vec::new();

    for event in &outcome.events {
        match event {
            IngestEvent::MalformedRecord { reason } => lines.push(format!(
                "  Skipped a code that is not part of a qrbeam transfer ({})",
                reason
            )),
            IngestEvent::Started { metadata } => {
                lines.push(format!(
                    "  Receiving {} ({}, {}) in {} codes",
                    metadata.file_name,
                    format_size(metadata.file_size),
                    metadata.file_type,
                    metadata.total_chunks
                ));
                lines.push(String::new());
            }
            IngestEvent::MetadataMismatch { found, .. } => lines.push(format!(
                "  Warning: code belongs to a different file ({}), keeping the current transfer",
                found.file_name
            )),
            IngestEvent::DuplicateUnit { index } => {
                lines.push(format!("  Code {} already scanned", index + 1));
            }
            IngestEvent::UnitAccepted { .. } | IngestEvent::TransferComplete => {}
        }
    }

    if let Some(milestone) = outcome.milestone {
        lines.push(format!(
            "  {} {}/{} ({}%)  missing: {}",
            progress_bar(milestone.received, milestone.total),
            milestone.received,
            milestone.total,
            milestone.percent(),
            format_missing(session.missing_iter(), session.missing_count(), MISSING_SHOWN)
        ));
    }

    lines
}

fn event_json(session: &ReceiveSession, event: &IngestEvent) -> serde_json::Value {
    match event {
        IngestEvent::MalformedRecord { reason } => serde_json::json!({
            "event": "malformed",
            "reason": reason,
        }),
        IngestEvent::Started { metadata } => serde_json::json!({
            "event": "started",
            "file_name": &metadata.file_name,
            "file_type": &metadata.file_type,
            "file_size": metadata.file_size,
            "total_chunks": metadata.total_chunks,
        }),
        IngestEvent::MetadataMismatch { expected, found } => serde_json::json!({
            "event": "metadata_mismatch",
            "expected": &expected.file_name,
            "found": &found.file_name,
        }),
        IngestEvent::DuplicateUnit { index } => serde_json::json!({
            "event": "duplicate",
            "index": index,
        }),
        IngestEvent::UnitAccepted { index, received } => serde_json::json!({
            "event": "accepted",
            "index": index,
            "received": received,
            "total": session.total_chunks(),
        }),
        IngestEvent::TransferComplete => serde_json::json!({
            "event": "complete",
        }),
    }
}

fn report_saved(
    session: &ReceiveSession,
    path: &Path,
    stats: &ScanStats,
    args: &ReceiveArgs,
) -> Result<()> {
    let size = session.metadata().map_or(0, |m| m.file_size);

    if args.json {
        let output = serde_json::json!({
            "status": "saved",
            "path": path.display().to_string(),
            "size": size,
            "scans": stats.scans(),
            "elapsed_secs": stats.elapsed().as_secs_f64(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !args.quiet {
        println!();
        println!("  Transfer complete!");
        println!();
        println!("  Saved {} to {}", format_size(size), path.display());
        println!(
            "  {} scans in {} ({:.1} scans/s)",
            stats.scans(),
            format_elapsed(stats.elapsed()),
            stats.scans_per_second()
        );
        println!();
    }

    Ok(())
}

fn report_incomplete(session: &ReceiveSession, args: &ReceiveArgs) -> Result<()> {
    if args.json {
        let missing: Vec<u32> = session.missing_iter().take(MISSING_LISTED_JSON).collect();
        let output = serde_json::json!({
            "status": "incomplete",
            "received": session.received_count(),
            "total": session.total_chunks(),
            "missing_count": session.missing_count(),
            "missing": missing,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !args.quiet && session.metadata().is_some() {
        println!();
        println!(
            "  Stopped with {}/{} codes ({:.0}%).",
            session.received_count(),
            session.total_chunks(),
            session.progress_percentage()
        );
        println!(
            "  Missing: {}",
            format_missing(session.missing_iter(), session.missing_count(), MISSING_SHOWN)
        );
        println!();
    }

    Ok(())
}
