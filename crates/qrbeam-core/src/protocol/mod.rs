//! Transport record wire format.
//!
//! Every QR code in a sequence carries exactly one transport record: a
//! compact JSON object describing one unit of the file plus the full file
//! metadata. The metadata is repeated on every record because codes may be
//! scanned in any order and any one of them may be the first seen.
//!
//! ## Record Format
//!
//! ```text
//! {
//!   "index": 0,                       unit position, 0..totalChunks
//!   "totalChunks": 4,                 units in this transfer
//!   "data": "AQID",                   base64 unit payload
//!   "fileName": "report.pdf",
//!   "fileType": "application/pdf",
//!   "fileSize": 10,                   bytes
//!   "fileExtension": "pdf"            optional, no leading dot
//! }
//! ```
//!
//! Unknown keys are ignored. A missing required key makes the record
//! malformed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Serialized records longer than this are likely to render as codes that
/// are hard to scan.
pub const RECORD_WARN_LEN: usize = 1000;

/// One unit of a transfer as carried by a single QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRecord {
    /// Zero-based unit position
    pub index: u32,
    /// Total number of units in this transfer
    pub total_chunks: u32,
    /// Base64 encoded unit payload
    pub data: String,
    /// Original file name
    pub file_name: String,
    /// MIME type of the file
    pub file_type: String,
    /// File size in bytes
    pub file_size: u64,
    /// Extension without the leading dot, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
}

impl TransportRecord {
    /// Parse a record from scanned text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRecord`] if the text is not a record, if
    /// its index lies outside `0..total_chunks`, or if a non-empty file
    /// claims more units than it has bytes.
    pub fn parse(text: &str) -> Result<Self> {
        let record: Self = serde_json::from_str(text.trim())
            .map_err(|e| Error::MalformedRecord(e.to_string()))?;

        if record.index >= record.total_chunks {
            return Err(Error::MalformedRecord(format!(
                "index {} out of range for {} unit(s)",
                record.index, record.total_chunks
            )));
        }

        if record.file_size > 0 && u64::from(record.total_chunks) > record.file_size {
            return Err(Error::MalformedRecord(format!(
                "{} unit(s) cannot carry a {}-byte file",
                record.total_chunks, record.file_size
            )));
        }

        Ok(record)
    }

    /// Serialize the record to its canonical wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if JSON encoding fails.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// The file metadata this record announces.
    ///
    /// Records from senders that omit `fileExtension` get one derived from
    /// the name and type.
    #[must_use]
    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            file_name: self.file_name.clone(),
            file_type: self.file_type.clone(),
            file_size: self.file_size,
            total_chunks: self.total_chunks,
            file_extension: self
                .file_extension
                .clone()
                .or_else(|| crate::file::derive_extension(&self.file_name, &self.file_type)),
        }
    }
}

/// File metadata for one transfer, as adopted by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Original file name
    pub file_name: String,
    /// MIME type of the file
    pub file_type: String,
    /// File size in bytes
    pub file_size: u64,
    /// Total number of units
    pub total_chunks: u32,
    /// Extension without the leading dot, if known
    pub file_extension: Option<String>,
}

impl FileMetadata {
    /// Whether a record belongs to the same transfer as this metadata.
    ///
    /// Compares name, type, size and unit count. The extension is derived
    /// from those and is not compared.
    #[must_use]
    pub fn matches(&self, record: &TransportRecord) -> bool {
        self.file_name == record.file_name
            && self.file_type == record.file_type
            && self.file_size == record.file_size
            && self.total_chunks == record.total_chunks
    }

    /// The name to save the received file under.
    ///
    /// Appends `.{extension}` when an extension is known and the name does
    /// not already end with it.
    ///
    /// # Example
    ///
    /// ```
    /// use qrbeam_core::protocol::FileMetadata;
    ///
    /// let meta = FileMetadata {
    ///     file_name: "report".to_string(),
    ///     file_type: "application/pdf".to_string(),
    ///     file_size: 10,
    ///     total_chunks: 1,
    ///     file_extension: Some("pdf".to_string()),
    /// };
    /// assert_eq!(meta.output_file_name(), "report.pdf");
    /// ```
    #[must_use]
    pub fn output_file_name(&self) -> String {
        match self.file_extension.as_deref() {
            Some(ext) if !ext.is_empty() && !self.file_name.ends_with(&format!(".{ext}")) => {
                format!("{}.{ext}", self.file_name)
            }
            _ => self.file_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TransportRecord {
        TransportRecord {
            index: 1,
            total_chunks: 4,
            data: "AQID".to_string(),
            file_name: "report".to_string(),
            file_type: "application/pdf".to_string(),
            file_size: 10,
            file_extension: Some("pdf".to_string()),
        }
    }

    #[test]
    fn test_wire_keys_are_camel_case() {
        let text = sample_record().to_text().unwrap();
        assert!(text.contains("\"totalChunks\":4"));
        assert!(text.contains("\"fileName\":\"report\""));
        assert!(text.contains("\"fileType\":\"application/pdf\""));
        assert!(text.contains("\"fileSize\":10"));
        assert!(text.contains("\"fileExtension\":\"pdf\""));
    }

    #[test]
    fn test_absent_extension_is_omitted() {
        let mut record = sample_record();
        record.file_extension = None;
        let text = record.to_text().unwrap();
        assert!(!text.contains("fileExtension"));
        assert_eq!(TransportRecord::parse(&text).unwrap(), record);
    }

    #[test]
    fn test_parse_tolerates_unknown_keys() {
        let text = r#"{"index":0,"totalChunks":1,"data":"","fileName":"a","fileType":"text/plain","fileSize":0,"checksum":"abc"}"#;
        let record = TransportRecord::parse(text).unwrap();
        assert_eq!(record.index, 0);
        assert_eq!(record.file_extension, None);
    }

    #[test]
    fn test_parse_missing_required_key() {
        let text = r#"{"index":0,"totalChunks":1,"data":"","fileName":"a","fileType":"text/plain"}"#;
        assert!(matches!(
            TransportRecord::parse(text),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_parse_not_json() {
        assert!(matches!(
            TransportRecord::parse("https://example.com"),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_parse_index_out_of_range() {
        let mut record = sample_record();
        record.index = 4;
        let text = record.to_text().unwrap();
        assert!(matches!(
            TransportRecord::parse(&text),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_parse_zero_total_is_malformed() {
        let text = r#"{"index":0,"totalChunks":0,"data":"","fileName":"a","fileType":"","fileSize":0}"#;
        assert!(TransportRecord::parse(text).is_err());
    }

    #[test]
    fn test_parse_more_units_than_bytes_is_malformed() {
        let text = r#"{"index":0,"totalChunks":4294967295,"data":"AQ==","fileName":"x","fileType":"","fileSize":1}"#;
        assert!(matches!(
            TransportRecord::parse(text),
            Err(Error::MalformedRecord(_))
        ));

        let mut record = sample_record();
        record.total_chunks = 10;
        let text = record.to_text().unwrap();
        assert!(TransportRecord::parse(&text).is_ok());
    }

    #[test]
    fn test_metadata_matches_ignores_index_and_data() {
        let record = sample_record();
        let meta = record.metadata();

        let mut other = record.clone();
        other.index = 3;
        other.data = "BAUG".to_string();
        assert!(meta.matches(&other));

        other.file_size = 11;
        assert!(!meta.matches(&other));
    }

    #[test]
    fn test_metadata_derives_missing_extension() {
        let mut record = sample_record();
        record.file_name = "scan".to_string();
        record.file_type = "image/png".to_string();
        record.file_extension = None;

        assert_eq!(record.metadata().file_extension.as_deref(), Some("png"));
    }

    #[test]
    fn test_output_file_name() {
        let mut meta = sample_record().metadata();
        assert_eq!(meta.output_file_name(), "report.pdf");

        meta.file_name = "report.pdf".to_string();
        assert_eq!(meta.output_file_name(), "report.pdf");

        meta.file_extension = None;
        meta.file_name = "notes".to_string();
        assert_eq!(meta.output_file_name(), "notes");
    }
}
