//! Inspect command implementation.

use std::path::Path;

use anyhow::{Context, Result};

use qrbeam_core::codec;
use qrbeam_core::file::format_size;
use qrbeam_core::protocol::TransportRecord;

use super::InspectArgs;

/// Run the inspect command.
pub async fn run(args: InspectArgs) -> Result<()> {
    let path = Path::new(&args.target);
    let inputs: Vec<String> = if path.is_file() {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    } else {
        vec![args.target.clone()]
    };

    let mut valid = 0usize;
    for (line, input) in inputs.iter().enumerate() {
        match TransportRecord::parse(input) {
            Ok(record) => {
                valid += 1;
                print_record(&record, args.json)?;
            }
            Err(e) if args.json => {
                let output = serde_json::json!({
                    "line": line + 1,
                    "error": e.to_string(),
                });
                println!("{}", serde_json::to_string(&output)?);
            }
            Err(e) => println!("  line {}: {}", line + 1, e),
        }
    }

    if !args.json && inputs.len() > 1 {
        println!();
        println!("  {} of {} lines are valid records", valid, inputs.len());
    }

    Ok(())
}

fn print_record(record: &TransportRecord, json: bool) -> Result<()> {
    let payload_len = codec::decode(&record.data).map(|b| b.len()).ok();
    let metadata = record.metadata();

    if json {
        let output = serde_json::json!({
            "index": record.index,
            "total_chunks": record.total_chunks,
            "file_name": &record.file_name,
            "file_type": &record.file_type,
            "file_size": record.file_size,
            "file_extension": &metadata.file_extension,
            "payload_bytes": payload_len,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!();
    println!("  Code {}/{}", record.index + 1, record.total_chunks);
    println!("    File:      {}", metadata.output_file_name());
    println!("    Type:      {}", record.file_type);
    println!("    Size:      {}", format_size(record.file_size));
    match payload_len {
        Some(len) => println!("    Payload:   {} bytes", len),
        None => println!("    Payload:   invalid base64"),
    }

    Ok(())
}
