//! CLI command definitions and handlers.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Load configuration with graceful fallback to defaults.
///
/// This function should be used by all commands to load the user's configuration.
/// If the config file doesn't exist or can't be parsed, it falls back to defaults.
pub fn load_config() -> qrbeam_core::config::Config {
    match qrbeam_core::config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unusable configuration file");
            qrbeam_core::config::Config::default()
        }
    }
}

pub mod config;
pub mod inspect;
pub mod receive;
pub mod send;

/// qrbeam - Air-gapped file transfer over QR codes
#[derive(Parser)]
#[command(name = "qrbeam")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Show a file as a sequence of QR codes
    Send(SendArgs),

    /// Rebuild a file from scanned QR code payloads
    Receive(ReceiveArgs),

    /// Decode transport records and print their metadata
    Inspect(InspectArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Image format for exported codes
#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// Scalable vector graphics
    Svg,
    /// Portable network graphics
    Png,
}

impl ExportFormat {
    /// File extension for this format.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

/// Arguments for the send command
#[derive(Parser)]
pub struct SendArgs {
    /// File to send
    pub path: PathBuf,

    /// Time each code stays on screen (e.g., 200ms, 1s)
    #[arg(short, long)]
    pub interval: Option<String>,

    /// Stop after the last code instead of starting over
    #[arg(long)]
    pub no_loop: bool,

    /// Bytes per code, overriding the size picked from the file type
    #[arg(short, long)]
    pub chunk_size: Option<usize>,

    /// Write one image per code to this directory instead of playing
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Image format for --export
    #[arg(short, long, value_enum, default_value = "svg")]
    pub format: ExportFormat,

    /// Play the sequence a single time
    #[arg(long, conflicts_with = "export")]
    pub once: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the receive command
#[derive(Parser)]
pub struct ReceiveArgs {
    /// File with one scanned payload per line ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Output directory for the received file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Drop a repeated identical scan within this window (e.g., 500ms)
    #[arg(short, long)]
    pub debounce: Option<String>,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Parser)]
pub struct InspectArgs {
    /// A record, or a file with one record per line
    pub target: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Show all configuration
    Show,

    /// List all available configuration keys
    List,

    /// Show the configuration file path
    Path,

    /// Reset to defaults
    Reset,
}
