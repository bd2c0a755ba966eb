use super::{Codec, ContentTypePattern, Encoder, value_to_string};
use crate::error::EncodingError;
use crate::request::Body;
use http::HeaderMap;
use serde_json::Value;

/// `text/*` codec. Bodies pass through without escaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl Codec for Text {
    fn name(&self) -> &'static str {
        "Text"
    }

    fn content_type(&self) -> ContentTypePattern {
        ContentTypePattern::Prefix("text/")
    }

    fn encode(
        &self,
        body: &Body,
        _headers: &mut HeaderMap,
        _encoder: &Encoder,
    ) -> Result<Vec<u8>, EncodingError> {
        match body {
            Body::Text(text) => Ok(text.as_bytes().to_vec()),
            Body::Json(value) => Ok(value_to_string(value).into_bytes()),
            Body::File(file) => Ok(file.read()?.to_vec()),
            Body::Form(_) => Err(EncodingError::InvalidBody {
                codec: "Text",
                expected: "text, a scalar value or a file",
                found: body.kind(),
            }),
        }
    }

    /// Invalid UTF-8 sequences are replaced with U+FFFD.
    fn decode(&self, body: &[u8]) -> Result<Value, EncodingError> {
        Ok(Value::String(String::from_utf8_lossy(body).into_owned()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::request::{FilePart, Form};
    use serde_json::json;

    fn encode(body: &Body) -> Result<Vec<u8>, EncodingError> {
        Text.encode(body, &mut HeaderMap::new(), &Encoder::new())
    }

    #[test]
    fn test_encode_is_verbatim() {
        assert_eq!(encode(&Body::Text("a \"quoted\" & <raw>".into())).unwrap(), b"a \"quoted\" & <raw>");
        assert_eq!(encode(&Body::Json(json!("bare"))).unwrap(), b"bare");
        assert_eq!(encode(&Body::Json(json!(42))).unwrap(), b"42");
    }

    #[test]
    fn test_encode_file_contents() {
        let file = FilePart::from_bytes("notes.txt", "line one\nline two");
        assert_eq!(encode(&Body::File(file)).unwrap(), b"line one\nline two");
    }

    #[test]
    fn test_encode_form_rejected() {
        assert!(encode(&Body::Form(Form::new().text("a", "b"))).is_err());
    }

    #[test]
    fn test_decode_returns_string() {
        assert_eq!(Text.decode(b"some text").unwrap(), json!("some text"));
        assert_eq!(Text.decode(b"").unwrap(), json!(""));
    }
}
