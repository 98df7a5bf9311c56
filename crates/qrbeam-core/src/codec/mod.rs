//! Binary to text transcoding for unit payloads.
//!
//! QR codes are produced from text records, so raw unit bytes travel as
//! standard padded base64.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;

use crate::error::{Error, Result};

/// Encode bytes as transport-safe text.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// Decode transport text back to bytes.
///
/// # Errors
///
/// Returns [`Error::MalformedRecord`] if the text is not valid base64.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(text)
        .map_err(|e| Error::MalformedRecord(format!("invalid payload encoding: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_value() {
        assert_eq!(encode(&[0x01, 0x02, 0x03]), "AQID");
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn test_decode_roundtrip_binary() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_decode_invalid() {
        let result = decode("not base64!");
        assert!(matches!(result, Err(Error::MalformedRecord(_))));
    }
}
