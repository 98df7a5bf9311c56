//! qrbeam CLI - Air-gapped file transfer over QR codes
//!
//! qrbeam moves a file between two devices with no network link: the
//! sender shows the file as a looping sequence of QR codes, the receiver
//! scans them in any order and rebuilds the file.
//!
//! ## Quick Start
//!
//! ```bash
//! # Show a file as QR codes
//! qrbeam send ./document.pdf
//!
//! # Rebuild it from decoded scans, one payload per line
//! qrbeam receive --input scans.txt --output ./inbox
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

use anyhow::Result;
use clap::Parser;

mod commands;
pub mod ui;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Send(args) => commands::send::run(args).await,
        Command::Receive(args) => commands::receive::run(args).await,
        Command::Inspect(args) => commands::inspect::run(args).await,
        Command::Config(args) => commands::config::run(args).await,
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,qrbeam=info,qrbeam_core=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
