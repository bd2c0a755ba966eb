use super::{Codec, ContentTypePattern, Encoder, value_to_string};
use crate::error::EncodingError;
use crate::request::{Body, FormField};
use http::HeaderMap;
use serde_json::Value;

/// `application/x-www-form-urlencoded` codec (encode only).
///
/// Keys and values are percent-encoded with spaces as `%20`, joined as
/// `key=value` pairs separated by `&` in field order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormEncoded;

impl Codec for FormEncoded {
    fn name(&self) -> &'static str {
        "FormEncoded"
    }

    fn content_type(&self) -> ContentTypePattern {
        ContentTypePattern::Prefix("application/x-www-form-urlencoded")
    }

    fn encode(
        &self,
        body: &Body,
        _headers: &mut HeaderMap,
        _encoder: &Encoder,
    ) -> Result<Vec<u8>, EncodingError> {
        let mut pairs: Vec<String> = Vec::new();
        match body {
            Body::Form(form) => {
                for (name, field) in form.iter() {
                    let FormField::Value(value) = field else {
                        return Err(invalid_body(body));
                    };
                    pairs.push(encode_pair(name, value));
                }
            }
            Body::Json(Value::Object(map)) => {
                pairs.extend(map.iter().map(|(name, value)| encode_pair(name, value)));
            }
            Body::Json(_) | Body::Text(_) | Body::File(_) => return Err(invalid_body(body)),
        }
        Ok(pairs.join("&").into_bytes())
    }

    fn decode(&self, _body: &[u8]) -> Result<Value, EncodingError> {
        Err(EncodingError::unsupported(
            "FormEncoded does not support deserialization",
        ))
    }
}

fn encode_pair(name: &str, value: &Value) -> String {
    format!(
        "{}={}",
        urlencoding::encode(name),
        urlencoding::encode(&value_to_string(value))
    )
}

fn invalid_body(body: &Body) -> EncodingError {
    EncodingError::InvalidBody {
        codec: "FormEncoded",
        expected: "a flat map of plain values",
        found: body.kind(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::encoder::FormPart;
    use crate::request::Form;
    use serde_json::json;

    fn encode(body: &Body) -> Result<String, EncodingError> {
        FormEncoded
            .encode(body, &mut HeaderMap::new(), &Encoder::new())
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_space_is_percent_encoded() {
        let form = Form::new().text("key", "value with a space").value("another_key", 1013);
        assert_eq!(encode(&Body::Form(form)).unwrap(), "key=value%20with%20a%20space&another_key=1013");
    }

    #[test]
    fn test_reserved_characters_in_keys_and_values() {
        let form = Form::new().text("a&b", "x=y/z?").value("flag", true);
        assert_eq!(encode(&Body::Form(form)).unwrap(), "a%26b=x%3Dy%2Fz%3F&flag=true");
    }

    #[test]
    fn test_json_object_body() {
        let body = Body::Json(json!({"grant_type": "client_credentials", "scope": "read write"}));
        assert_eq!(encode(&body).unwrap(), "grant_type=client_credentials&scope=read%20write");
    }

    #[test]
    fn test_non_flat_bodies_rejected() {
        assert!(encode(&Body::Json(json!(["a"]))).is_err());
        assert!(encode(&Body::Text("a=b".into())).is_err());

        let form = Form::new().part("p", FormPart::new("v", std::iter::empty::<(&str, &str)>()));
        assert!(encode(&Body::Form(form)).is_err());
    }

    #[test]
    fn test_decode_unsupported() {
        let err = FormEncoded.decode(b"a=b").unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "FormEncoded does not support deserialization");
    }
}
