//! Send command implementation.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};
use crossterm::ExecutableCommand;
use tokio_util::sync::CancellationToken;

use qrbeam_core::chunk::LARGE_SEQUENCE_WARNING;
use qrbeam_core::config::{format_duration, parse_duration};
use qrbeam_core::file::format_size;
use qrbeam_core::qr::{self, QrConfig};
use qrbeam_core::sequence::{run_playback, Playback, PlaybackEnd, Sequence};

use super::{ExportFormat, SendArgs};
use crate::ui::{progress_bar, FileBox};

/// Run the send command.
pub async fn run(args: SendArgs) -> Result<()> {
    let global_config = super::load_config();

    let interval = match args.interval.as_deref() {
        Some(s) => parse_duration(s)
            .with_context(|| format!("Invalid interval '{}', expected e.g. 200ms or 1s", s))?,
        None => global_config.transfer.playback_interval,
    };

    let chunk_size = args.chunk_size.or(global_config.transfer.chunk_size);
    if chunk_size == Some(0) {
        bail!("Chunk size must be greater than zero");
    }

    let sequence = Sequence::from_path(&args.path, chunk_size)?;
    if sequence.is_empty() {
        return Err(qrbeam_core::Error::EmptyFile(sequence.source().name().to_string()).into());
    }

    let qr_config = QrConfig::from(&global_config.qr);

    if !args.quiet {
        display_sequence_info(&sequence);
    }

    if let Some(dir) = &args.export {
        return export(&sequence, dir, args.format, &qr_config, args.quiet);
    }

    let frames = sequence
        .records()
        .iter()
        .map(|record| qr::generate_ascii(record, &qr_config))
        .collect::<qrbeam_core::Result<Vec<_>>>()
        .context("Failed to render QR codes, try a smaller --chunk-size")?;

    let mut playback = Playback::new(sequence.len());
    playback.set_interval(interval);
    playback.set_looping(!args.once && !args.no_loop && global_config.transfer.looping);

    if playback.interval() != interval {
        tracing::warn!(
            requested = %format_duration(interval),
            used = %format_duration(playback.interval()),
            "Interval out of range, clamped"
        );
    }

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let total = sequence.len();
    let looping = playback.is_looping();
    let mut stdout = io::stdout();

    let end = run_playback(&sequence, &mut playback, &token, |index, _record| {
        stdout.execute(Clear(ClearType::All))?;
        stdout.execute(MoveTo(0, 0))?;

        writeln!(stdout, "{}", frames[index])?;
        writeln!(
            stdout,
            "  Code {}/{} {}{}",
            index + 1,
            total,
            progress_bar(
                u32::try_from(index + 1).unwrap_or(u32::MAX),
                u32::try_from(total).unwrap_or(u32::MAX)
            ),
            if looping { "  (looping)" } else { "" }
        )?;
        writeln!(stdout, "  Press Ctrl+C to stop")?;
        stdout.flush()?;
        Ok(())
    })
    .await?;

    token.cancel();

    if !args.quiet {
        println!();
        match end {
            PlaybackEnd::Finished => println!("  All {} codes shown.", total),
            PlaybackEnd::Cancelled => println!("  Stopped at code {}/{}.", playback.index() + 1, total),
        }
        println!();
    }

    Ok(())
}

fn display_sequence_info(sequence: &Sequence) {
    let source = sequence.source();

    println!();
    println!("qrbeam v{}", qrbeam_core::VERSION);
    println!("{}", "-".repeat(37));
    println!();

    FileBox::new(source.name())
        .with_line(format!("{}  ·  {}", format_size(source.size()), source.mime_type()))
        .with_line(format!(
            "{} codes of {} bytes",
            sequence.len(),
            sequence.chunk_size()
        ))
        .display();
    println!();

    if sequence.len() > LARGE_SEQUENCE_WARNING {
        println!(
            "  Note: this file needs {} codes. Consider a larger --chunk-size",
            sequence.len()
        );
        println!("  or a smaller file if scanning is slow.");
        println!();
    }
}

fn export(
    sequence: &Sequence,
    dir: &Path,
    format: ExportFormat,
    qr_config: &QrConfig,
    quiet: bool,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let total = sequence.len();
    for (index, record) in sequence.records().iter().enumerate() {
        let path = dir.join(export_file_name(sequence.source().name(), index, total, format));

        match format {
            ExportFormat::Svg => std::fs::write(&path, qr::generate_svg(record, qr_config)?)?,
            ExportFormat::Png => std::fs::write(&path, qr::generate_png(record, qr_config)?)?,
        }
        tracing::debug!(path = %path.display(), "Exported code");
    }

    if !quiet {
        println!("  Wrote {} {} files to {}", total, format.extension(), dir.display());
        println!();
    }

    Ok(())
}

/// Image file name for one code, e.g. `report.pdf-003-of-120.svg`.
fn export_file_name(source_name: &str, index: usize, total: usize, format: ExportFormat) -> String {
    let width = total.to_string().len().max(3);
    format!(
        "{}-{:0width$}-of-{}.{}",
        source_name,
        index + 1,
        total,
        format.extension(),
        width = width
    )
}
