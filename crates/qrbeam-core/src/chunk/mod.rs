//! Chunk sizing and splitting.
//!
//! A file is cut into fixed-size units (the last one may be short), each
//! wrapped in a [`TransportRecord`] and serialized to the text a QR code
//! is rendered from.
//!
//! ## Chunk Sizes
//!
//! | MIME type | Bytes per unit |
//! |-----------|----------------|
//! | `text/*` | 512 |
//! | contains `image/`, `audio/`, `video/` | 128 |
//! | anything else | 256 |
//!
//! Dense binary data gets the smallest units so the rendered code stays
//! scannable.

use crate::codec;
use crate::error::{Error, Result};
use crate::file::{self, DEFAULT_MIME_TYPE, UNKNOWN_FILE_NAME};
use crate::protocol::{TransportRecord, RECORD_WARN_LEN};

/// Bytes per unit for `text/*` files.
pub const TEXT_CHUNK_SIZE: usize = 512;

/// Bytes per unit for image, audio and video files.
pub const MEDIA_CHUNK_SIZE: usize = 128;

/// Bytes per unit for every other file type.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Above this many units a sequence takes long enough to scan that the
/// sender should be warned.
pub const LARGE_SEQUENCE_WARNING: usize = 50;

/// Pick the number of bytes per unit for a MIME type.
///
/// Always positive, for any input including the empty string.
///
/// # Example
///
/// ```
/// use qrbeam_core::chunk::chunk_size_for;
///
/// assert_eq!(chunk_size_for("text/plain"), 512);
/// assert_eq!(chunk_size_for("image/png"), 128);
/// assert_eq!(chunk_size_for("application/pdf"), 256);
/// ```
#[must_use]
pub fn chunk_size_for(mime_type: &str) -> usize {
    if mime_type.starts_with("text/") {
        TEXT_CHUNK_SIZE
    } else if ["image/", "audio/", "video/"]
        .iter()
        .any(|kind| mime_type.contains(kind))
    {
        MEDIA_CHUNK_SIZE
    } else {
        DEFAULT_CHUNK_SIZE
    }
}

/// Number of units a file of `file_size` bytes splits into.
///
/// A zero chunk size yields zero.
#[must_use]
pub fn estimate_unit_count(file_size: u64, chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        return 0;
    }
    file_size.div_ceil(chunk_size as u64)
}

/// Metadata describing the file being split.
///
/// Missing fields fall back to `"unknown"`, `"application/octet-stream"`
/// and `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    /// File name
    pub name: Option<String>,
    /// MIME type
    pub mime_type: Option<String>,
    /// Declared size in bytes
    pub size: Option<u64>,
}

impl SourceFile {
    /// Describe a file by name, type and size.
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: Some(name.into()),
            mime_type: Some(mime_type.into()),
            size: Some(size),
        }
    }

    /// The file name, or `"unknown"`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_FILE_NAME)
    }

    /// The MIME type, or `"application/octet-stream"`.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// The declared size, or `0`.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}

/// Split `bytes` into serialized transport records of `chunk_size` bytes.
///
/// An empty buffer yields no records.
///
/// # Errors
///
/// Returns [`Error::InvalidChunkSize`] for a zero chunk size, or
/// [`Error::InvalidConfig`] if the buffer needs more units than fit a
/// `u32` index.
pub fn split(bytes: &[u8], chunk_size: usize, source: &SourceFile) -> Result<Vec<String>> {
    let records = split_records(bytes, chunk_size, source)?;

    records
        .iter()
        .map(|record| {
            let text = record.to_text()?;
            if text.len() > RECORD_WARN_LEN {
                tracing::warn!(
                    index = record.index,
                    length = text.len(),
                    "Record is large, QR code may be difficult to scan"
                );
            }
            Ok(text)
        })
        .collect()
}

/// Split `bytes` into transport records without serializing them.
///
/// # Errors
///
/// See [`split`].
pub fn split_records(
    bytes: &[u8],
    chunk_size: usize,
    source: &SourceFile,
) -> Result<Vec<TransportRecord>> {
    if chunk_size == 0 {
        return Err(Error::InvalidChunkSize(chunk_size));
    }

    let total_chunks = u32::try_from(bytes.len().div_ceil(chunk_size)).map_err(|_| {
        Error::InvalidConfig {
            key: "chunk_size".to_string(),
            reason: format!("{chunk_size} bytes per unit needs more than u32::MAX units"),
        }
    })?;

    let file_name = source.name();
    let file_type = source.mime_type();
    let file_size = source.size();
    let file_extension = file::derive_extension(file_name, file_type);

    let records: Vec<TransportRecord> = bytes
        .chunks(chunk_size)
        .zip(0..total_chunks)
        .map(|(slice, index)| TransportRecord {
            index,
            total_chunks,
            data: codec::encode(slice),
            file_name: file_name.to_string(),
            file_type: file_type.to_string(),
            file_size,
            file_extension: file_extension.clone(),
        })
        .collect();

    if let Some(first) = records.first() {
        tracing::debug!(
            file_name,
            file_type,
            total_chunks,
            chunk_size,
            extension = ?first.file_extension,
            "Split file into units"
        );
    }

    Ok(records)
}
