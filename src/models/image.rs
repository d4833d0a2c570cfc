use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Binary image plus its mime type, as submitted to or returned from a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Decode a base64 body as returned inline by a model.
    pub fn from_base64(mime_type: impl Into<String>, data: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| PipelineError::Serialization(format!("invalid base64 image: {}", e)))?;
        Ok(Self::new(mime_type, bytes))
    }

    /// Parse `data:<mime>;base64,<payload>`. Returns `None` when the string is
    /// not a data URI at all, and an error when it is one but cannot be decoded.
    pub fn from_data_uri(uri: &str) -> Option<Result<Self>> {
        let rest = uri.strip_prefix("data:")?;
        let parsed = match rest.split_once(";base64,") {
            Some((mime, data)) => {
                let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME } else { mime };
                Self::from_base64(mime, data)
            }
            None => Err(PipelineError::ReferenceFetch(
                "data URI is not base64 encoded".into(),
            )),
        };
        Some(parsed)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_png_data_uri() {
        let payload = ImagePayload::from_data_uri("data:image/png;base64,iVBORw0KGgo=")
            .unwrap()
            .unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(&payload.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_plain_url_is_not_a_data_uri() {
        assert!(ImagePayload::from_data_uri("https://example.com/a.png").is_none());
    }

    #[test]
    fn test_broken_base64_is_an_error() {
        let parsed = ImagePayload::from_data_uri("data:image/png;base64,@@@").unwrap();
        assert!(parsed.is_err());
    }

    #[test]
    fn test_data_uri_without_base64_marker() {
        let parsed = ImagePayload::from_data_uri("data:text/plain,hello").unwrap();
        assert!(matches!(parsed, Err(PipelineError::ReferenceFetch(_))));
    }

    #[test]
    fn test_to_data_uri() {
        let payload = ImagePayload::new("image/webp", vec![1, 2, 3]);
        assert_eq!(payload.to_data_uri(), "data:image/webp;base64,AQID");
    }
}
