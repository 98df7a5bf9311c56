//! File helpers for qrbeam.
//!
//! This module handles:
//! - Extension derivation from a file name or MIME type
//! - MIME detection for files picked from disk
//! - Safe output file names for received files
//! - Human readable sizes

use std::path::{Path, PathBuf};

/// MIME type used when a file's type is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// File name used when the sender did not provide one.
pub const UNKNOWN_FILE_NAME: &str = "unknown";

/// Common MIME types and the extension a received file should carry.
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/svg+xml", "svg"),
    ("text/plain", "txt"),
    ("text/html", "html"),
    ("text/css", "css"),
    ("text/javascript", "js"),
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("application/zip", "zip"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "pptx",
    ),
    ("audio/mpeg", "mp3"),
    ("audio/wav", "wav"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
];

/// Get the lowercase extension from the last dot-segment of a file name.
///
/// Returns `None` when the name has no dot or ends with one.
#[must_use]
pub fn extension_from_name(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Look up the conventional extension for a MIME type.
#[must_use]
pub fn extension_from_mime(mime_type: &str) -> Option<&'static str> {
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, ext)| *ext)
}

/// Derive the extension announced on every record.
///
/// The file name wins; the MIME table is the fallback.
///
/// # Example
///
/// ```
/// use qrbeam_core::file::derive_extension;
///
/// assert_eq!(derive_extension("Notes.MD", "text/markdown"), Some("md".to_string()));
/// assert_eq!(derive_extension("report", "application/pdf"), Some("pdf".to_string()));
/// assert_eq!(derive_extension("blob", "application/x-custom"), None);
/// ```
#[must_use]
pub fn derive_extension(file_name: &str, mime_type: &str) -> Option<String> {
    extension_from_name(file_name).or_else(|| extension_from_mime(mime_type).map(str::to_string))
}

/// Guess the MIME type of a file on disk from its path.
#[must_use]
pub fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map_or_else(|| DEFAULT_MIME_TYPE.to_string(), |m| m.to_string())
}

/// Reduce a received file name to a single safe path component.
///
/// Directory components are stripped. Returns `None` when nothing usable
/// remains (empty, `.` or `..`).
#[must_use]
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .unwrap_or_default();

    if last.is_empty() || last == "." || last == ".." {
        None
    } else {
        Some(last.to_string())
    }
}

/// Resolve where a received file should be written inside `output_dir`.
///
/// Falls back to [`UNKNOWN_FILE_NAME`] when the announced name is unusable.
#[must_use]
pub fn output_path(output_dir: &Path, file_name: &str) -> PathBuf {
    let name = sanitize_file_name(file_name).unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string());
    output_dir.join(name)
}

/// Format a file size for display.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
