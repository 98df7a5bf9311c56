//! # qrbeam Core Library
//!
//! `qrbeam-core` provides the chunking and reassembly protocol behind
//! qrbeam, a tool for moving a file between two devices with no network
//! link by showing a sequence of QR codes on one screen and scanning them
//! with the other device's camera.
//!
//! ## Features
//!
//! - **Self-describing units**: every QR code carries its index, the total
//!   unit count and the full file metadata, so any code can be scanned first
//! - **Order-independent receiving**: units are accumulated by index and
//!   assembled once every index is present
//! - **Duplicate tolerant**: rescanning a code is harmless
//! - **Scannable sizing**: unit size follows the file's MIME type to keep
//!   the rendered codes dense enough, but no denser
//!
//! ## Modules
//!
//! - [`assemble`] - Reassembly of a complete unit set into the file bytes
//! - [`chunk`] - Chunk sizing and splitting a buffer into transport records
//! - [`codec`] - Binary to text transcoding for unit payloads
//! - [`config`] - Configuration management
//! - [`mod@file`] - File name, extension and MIME helpers
//! - [`protocol`] - Transport record wire format
//! - [`qr`] - QR code rendering (terminal, SVG, PNG)
//! - [`scan`] - Scan stream debouncing and scan statistics
//! - [`sequence`] - Sender-side sequence and playback cursor
//! - [`session`] - Receiver-side accumulation state machine
//!
//! ## Example
//!
//! ```rust
//! use qrbeam_core::sequence::Sequence;
//! use qrbeam_core::session::ReceiveSession;
//!
//! let sequence = Sequence::from_bytes(b"hello, world", "hello.txt", "text/plain", Some(4))?;
//!
//! let mut session = ReceiveSession::new();
//! for record in sequence.records().iter().rev() {
//!     session.ingest(record);
//! }
//!
//! assert!(session.is_complete());
//! assert_eq!(session.assemble()?, b"hello, world");
//! # Ok::<(), qrbeam_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod assemble;
pub mod chunk;
pub mod codec;
pub mod config;
pub mod error;
pub mod file;
pub mod protocol;
pub mod qr;
pub mod scan;
pub mod sequence;
pub mod session;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default interval between frames during playback (200 ms)
pub const DEFAULT_PLAYBACK_INTERVAL_MS: u64 = 200;

/// Shortest allowed playback interval
pub const MIN_PLAYBACK_INTERVAL_MS: u64 = 200;

/// Longest allowed playback interval
pub const MAX_PLAYBACK_INTERVAL_MS: u64 = 3000;

/// Default window for suppressing a repeated scan of the same payload (500 ms)
pub const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 500;
