use super::{Codec, ContentTypePattern, Encoder};
use crate::error::EncodingError;
use crate::request::{Body, FormField};
use http::HeaderMap;
use serde_json::{Map, Value};

/// `application/json` codec.
///
/// Accepts `Json` bodies, `Text` bodies (encoded as a JSON string) and
/// `Form` bodies made only of plain values (encoded as an object in field
/// order).
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Codec for Json {
    fn name(&self) -> &'static str {
        "Json"
    }

    fn content_type(&self) -> ContentTypePattern {
        ContentTypePattern::Exact("application/json")
    }

    fn encode(
        &self,
        body: &Body,
        _headers: &mut HeaderMap,
        _encoder: &Encoder,
    ) -> Result<Vec<u8>, EncodingError> {
        match body {
            Body::Json(value) => Ok(serde_json::to_vec(value)?),
            Body::Text(text) => Ok(serde_json::to_vec(text)?),
            Body::Form(form) => {
                let mut object = Map::new();
                for (name, field) in form.iter() {
                    let FormField::Value(value) = field else {
                        return Err(invalid_body(body));
                    };
                    object.insert(name.to_owned(), value.clone());
                }
                Ok(serde_json::to_vec(&Value::Object(object))?)
            }
            Body::File(_) => Err(invalid_body(body)),
        }
    }

    fn decode(&self, body: &[u8]) -> Result<Value, EncodingError> {
        Ok(serde_json::from_slice(body)?)
    }
}

fn invalid_body(body: &Body) -> EncodingError {
    EncodingError::InvalidBody {
        codec: "Json",
        expected: "a JSON value or a form of plain values",
        found: body.kind(),
    }
}
