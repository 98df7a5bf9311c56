//! Error types for qrbeam.
//!
//! This module provides a unified error type for all qrbeam operations.
//! Per-unit anomalies seen while receiving (malformed records, metadata
//! mismatches, duplicates) are not errors: they are reported as
//! [`IngestEvent`](crate::session::IngestEvent)s and never abort a transfer.

use std::io;

use thiserror::Error;

/// A specialized `Result` type for qrbeam operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for qrbeam.
#[derive(Error, Debug)]
pub enum Error {
    /// A scanned payload is not a valid transport record (E001)
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Assembly attempted before every unit was received (E002)
    #[error("cannot assemble: {} unit(s) missing", missing.len())]
    MissingUnits {
        /// Indices that have not been received, ascending
        missing: Vec<u32>,
    },

    /// No transfer has started on this session
    #[error("no transfer in progress")]
    NoActiveTransfer,

    /// Chunk size must be positive (E003)
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(usize),

    /// File has no content to send (E004)
    #[error("file '{0}' is empty, nothing to send")]
    EmptyFile(String),

    /// QR code rendering failed
    #[error("failed to render QR code: {0}")]
    QrRender(String),

    /// File not found
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Invalid path
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns the error code associated with this error, if any.
    ///
    /// Error codes follow the pattern EXXX where XXX is a 3-digit number.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::MalformedRecord(_) => Some("E001"),
            Self::MissingUnits { .. } => Some("E002"),
            Self::InvalidChunkSize(_) => Some("E003"),
            Self::EmptyFile(_) => Some("E004"),
            _ => None,
        }
    }

    /// Returns whether this error is recoverable by scanning more codes.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedRecord(_) | Self::MissingUnits { .. })
    }

    /// Returns a helpful suggestion for resolving the error, if applicable.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MalformedRecord(_) => Some(
                "The code was not produced by qrbeam or was only partially decoded.\n\
                 Hold the camera steady and scan it again.",
            ),
            Self::MissingUnits { .. } => Some(
                "Keep the sender looping and scan the codes listed as missing.\n\
                 Slowing playback down (e.g. --interval 1s) makes scanning easier.",
            ),
            Self::InvalidChunkSize(_) => Some(
                "Use a positive chunk size, or remove the override to size\n\
                 chunks from the file type automatically.",
            ),
            Self::EmptyFile(_) => Some("Empty files produce no codes; create the file on the receiver instead."),
            _ => None,
        }
    }
}
