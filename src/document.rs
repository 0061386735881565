//! Documents passed between pipeline stages.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw content of the fetched object.
#[derive(Debug, Clone)]
pub struct RawPayload {
    bytes: Bytes,
}

impl RawPayload {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Interpret the payload as text. X12 interchanges are ASCII, so anything
    /// that is not valid UTF-8 is rejected rather than lossily converted.
    pub fn as_text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }
}

/// Normalized document produced by the translate stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntermediateDocument(pub Value);

/// Target-schema document produced by the map stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputDocument(pub Value);

impl OutputDocument {
    /// Read the identifying field used to name the stored artifact.
    ///
    /// Strings are trimmed; numbers are rendered as-is. Missing, null,
    /// empty and non-scalar values yield `None`.
    pub fn identifier(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Pretty-printed JSON body for upload.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_string_and_number() {
        let doc = OutputDocument(json!({ "po_number": " 365465413 " }));
        assert_eq!(doc.identifier("po_number").as_deref(), Some("365465413"));

        let doc = OutputDocument(json!({ "po_number": 42 }));
        assert_eq!(doc.identifier("po_number").as_deref(), Some("42"));
    }

    #[test]
    fn test_identifier_missing_or_unusable() {
        let doc = OutputDocument(json!({ "po_number": "" }));
        assert!(doc.identifier("po_number").is_none());

        let doc = OutputDocument(json!({ "po_number": null }));
        assert!(doc.identifier("po_number").is_none());

        let doc = OutputDocument(json!({ "po_number": { "value": 1 } }));
        assert!(doc.identifier("po_number").is_none());

        let doc = OutputDocument(json!(["po_number"]));
        assert!(doc.identifier("po_number").is_none());

        let doc = OutputDocument(json!({ "order": "1" }));
        assert!(doc.identifier("po_number").is_none());
    }

    #[test]
    fn test_raw_payload_text() {
        let payload = RawPayload::new(b"ISA*00*~".to_vec());
        assert_eq!(payload.len(), 8);
        assert_eq!(payload.as_text().unwrap(), "ISA*00*~");

        let payload = RawPayload::new(vec![0xff, 0xfe]);
        assert!(payload.as_text().is_err());
    }

    #[test]
    fn test_to_json_bytes_is_pretty() {
        let doc = OutputDocument(json!({ "po_number": "1", "lines": [] }));
        let body = String::from_utf8(doc.to_json_bytes().unwrap()).unwrap();
        assert!(body.contains("\n  \"po_number\": \"1\""));
    }
}
