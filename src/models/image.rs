use base64::Engine as _;
use serde::{Deserialize, Serialize};

const JPEG: &str = "image/jpeg";
const UNKNOWN: &str = "application/octet-stream";

/// Encoded image payload, kept as base64 until a renderer needs the bytes.
///
/// Bytes are only decoded by the report's image block, so a bad payload
/// degrades that block alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub media_type: String,
    pub base64: String,
}

impl ImageData {
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.to_string(),
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Bare base64 JPEG, as returned in the inference `mask` field.
    pub fn jpeg_base64(encoded: &str) -> Self {
        Self {
            media_type: JPEG.to_string(),
            base64: encoded.trim().to_string(),
        }
    }

    /// Parses `data:<media type>;base64,<payload>`.
    ///
    /// Anything else is taken as a bare base64 payload of unknown type.
    pub fn from_data_url(url: &str) -> Self {
        let url = url.trim();
        if let Some(rest) = url.strip_prefix("data:") {
            if let Some((header, payload)) = rest.split_once(',') {
                let media_type = header
                    .strip_suffix(";base64")
                    .filter(|m| !m.is_empty())
                    .unwrap_or(UNKNOWN);
                return Self {
                    media_type: media_type.to_string(),
                    base64: payload.to_string(),
                };
            }
        }
        Self {
            media_type: UNKNOWN.to_string(),
            base64: url.to_string(),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.base64.as_bytes())
    }
}
