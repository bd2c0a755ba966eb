use super::{Codec, ContentTypePattern, Encoder, FormPart, value_to_string};
use crate::error::EncodingError;
use crate::request::{Body, FilePart, FormField};
use http::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderValue};
use mime::Mime;
use rand::Rng;
use serde_json::Value;
use std::path::Path;

const CRLF: &str = "\r\n";

/// `multipart/form-data` codec (encode only).
///
/// Generates a fresh boundary per request and appends it to the request's
/// `Content-Type`. Value fields and [`FormPart`]s are emitted first, in field
/// order, followed by all file fields; servers expecting that layout may
/// rely on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multipart;

impl Codec for Multipart {
    fn name(&self) -> &'static str {
        "Multipart"
    }

    fn content_type(&self) -> ContentTypePattern {
        ContentTypePattern::Prefix("multipart/")
    }

    fn encode(
        &self,
        body: &Body,
        headers: &mut HeaderMap,
        encoder: &Encoder,
    ) -> Result<Vec<u8>, EncodingError> {
        let boundary = generate_boundary();

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("multipart/form-data");
        let content_type = format!("{content_type}; boundary={boundary}");
        headers.insert(CONTENT_TYPE, HeaderValue::try_from(content_type)?);

        encode_with_boundary(body, &boundary, encoder)
    }

    fn decode(&self, _body: &[u8]) -> Result<Value, EncodingError> {
        Err(EncodingError::unsupported(
            "Multipart does not support deserialization",
        ))
    }
}

fn generate_boundary() -> String {
    let mut rng = rand::rng();
    format!("{:016x}{:016x}", rng.random::<u64>(), rng.random::<u64>())
}

fn encode_with_boundary(
    body: &Body,
    boundary: &str,
    encoder: &Encoder,
) -> Result<Vec<u8>, EncodingError> {
    let mut value_parts: Vec<Vec<u8>> = Vec::new();
    let mut file_parts: Vec<Vec<u8>> = Vec::new();

    match body {
        Body::Form(form) => {
            for (name, field) in form.iter() {
                match field {
                    FormField::Value(value) => value_parts.push(form_field(name, value)),
                    FormField::Part(part) => value_parts.push(form_part(name, part, encoder)?),
                    FormField::File(file) => file_parts.push(file_part(name, file)?),
                }
            }
        }
        Body::Json(Value::Object(map)) => {
            for (name, value) in map {
                value_parts.push(form_field(name, value));
            }
        }
        Body::Json(_) | Body::Text(_) | Body::File(_) => {
            return Err(EncodingError::InvalidBody {
                codec: "Multipart",
                expected: "a form or a JSON object",
                found: body.kind(),
            });
        }
    }

    let mut out = Vec::new();
    for part in value_parts.iter().chain(file_parts.iter()) {
        out.extend_from_slice(format!("--{boundary}{CRLF}").as_bytes());
        out.extend_from_slice(part);
    }
    out.extend_from_slice(format!("--{boundary}--").as_bytes());
    Ok(out)
}

fn form_field(name: &str, value: &Value) -> Vec<u8> {
    format!(
        "Content-Disposition: form-data; name=\"{name}\"{CRLF}{CRLF}{}{CRLF}",
        value_to_string(value)
    )
    .into_bytes()
}

fn form_part(name: &str, part: &FormPart, encoder: &Encoder) -> Result<Vec<u8>, EncodingError> {
    let filename = if part.content_type() == Some("application/json") {
        format!("; filename=\"{name}.json\"")
    } else {
        String::new()
    };
    let headers: String = part
        .headers()
        .iter()
        .map(|(header, value)| format!("{header}: {value}{CRLF}"))
        .collect();

    let mut out =
        format!("Content-Disposition: form-data; name=\"{name}\"{filename}{CRLF}{headers}{CRLF}")
            .into_bytes();
    match part.content_type() {
        Some(content_type) => {
            let mut part_headers = HeaderMap::new();
            part_headers.insert(CONTENT_TYPE, HeaderValue::try_from(content_type)?);
            if let Some((_, encoding)) = part
                .headers()
                .iter()
                .find(|(header, _)| header == "Content-Encoding")
            {
                part_headers.insert(CONTENT_ENCODING, HeaderValue::try_from(encoding.as_str())?);
            }
            out.extend_from_slice(&encoder.serialize(part.value(), &mut part_headers)?);
        }
        None => out.extend_from_slice(&raw_value(part.value())?),
    }
    out.extend_from_slice(CRLF.as_bytes());
    Ok(out)
}

fn raw_value(value: &Body) -> Result<Vec<u8>, EncodingError> {
    match value {
        Body::Text(text) => Ok(text.as_bytes().to_vec()),
        Body::Json(value) => Ok(value_to_string(value).into_bytes()),
        Body::File(file) => Ok(file.read()?.to_vec()),
        Body::Form(_) => Err(EncodingError::InvalidBody {
            codec: "Multipart",
            expected: "a part value with a Content-Type header",
            found: value.kind(),
        }),
    }
}

fn file_part(name: &str, file: &FilePart) -> Result<Vec<u8>, EncodingError> {
    let contents = file.read()?;
    let mut out = format!(
        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"{CRLF}Content-Type: {}{CRLF}{CRLF}",
        file.file_name(),
        mime_type_for_file_name(file.file_name()),
    )
    .into_bytes();
    out.extend_from_slice(&contents);
    out.extend_from_slice(CRLF.as_bytes());
    Ok(out)
}

/// MIME type announced for an uploaded file, from its extension.
///
/// Only the image and PDF types the upload endpoints accept are recognised;
/// everything else is `application/octet-stream`.
#[must_use]
pub fn mime_type_for_file_name(file_name: &str) -> Mime {
    let extension = Path::new(file_name.trim())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("png") => mime::IMAGE_PNG,
        Some("pdf") => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
