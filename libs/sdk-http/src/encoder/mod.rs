//! Content-type driven body codecs.
//!
//! The [`Encoder`] owns an ordered list of [`Codec`]s and routes every
//! serialize/deserialize call to the first codec whose
//! [`ContentTypePattern`] matches the message's `Content-Type`. The default
//! registration order is:
//!
//! 1. [`Json`]: `application/json`
//! 2. [`Text`]: `text/*`
//! 3. [`Multipart`]: `multipart/*`
//! 4. [`FormEncoded`]: `application/x-www-form-urlencoded*`
//!
//! Gzip framing is applied on top of whatever the codec produced when the
//! message carries `Content-Encoding: gzip` (exact, case-sensitive match).

mod form_encoded;
mod form_part;
mod json;
mod multipart;
mod text;

pub use form_encoded::FormEncoded;
pub use form_part::FormPart;
pub use json::Json;
pub use multipart::{Multipart, mime_type_for_file_name};
pub use text::Text;

use crate::error::EncodingError;
use crate::request::{Body, HttpRequest};
use bytes::Bytes;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderMap};
use serde_json::Value;
use std::fmt;
use std::io::{Read, Write};

/// Matcher used to select a codec by media type.
///
/// Parameters (`; charset=utf8`) are ignored and comparison is
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTypePattern {
    /// Media type must equal the pattern
    Exact(&'static str),
    /// Media type must start with the pattern
    Prefix(&'static str),
}

impl ContentTypePattern {
    #[must_use]
    pub fn matches(&self, content_type: &str) -> bool {
        let media_type = media_type(content_type);
        match self {
            Self::Exact(expected) => media_type.eq_ignore_ascii_case(expected),
            Self::Prefix(prefix) => media_type
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
        }
    }
}

impl fmt::Display for ContentTypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(expected) => f.write_str(expected),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
        }
    }
}

/// `"Application/JSON; charset=utf8"` -> `"Application/JSON"`
fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

/// A content-type scoped encode/decode pair.
///
/// `encode` receives the request headers mutably: codecs may rewrite
/// `Content-Type` (multipart appends its boundary there). It also receives
/// the owning [`Encoder`] so nested payloads can be serialized with the
/// same registry.
pub trait Codec: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &'static str;

    fn content_type(&self) -> ContentTypePattern;

    /// Encode a request body.
    ///
    /// # Errors
    /// Returns `EncodingError` if the body cannot be represented by this codec.
    fn encode(
        &self,
        body: &Body,
        headers: &mut HeaderMap,
        encoder: &Encoder,
    ) -> Result<Vec<u8>, EncodingError>;

    /// Decode a response body (already gunzipped).
    ///
    /// # Errors
    /// Returns `EncodingError` if the body is malformed or the codec is
    /// encode-only.
    fn decode(&self, body: &[u8]) -> Result<Value, EncodingError>;
}

/// Ordered codec registry with gzip framing.
pub struct Encoder {
    codecs: Vec<Box<dyn Codec>>,
    max_decoded_size: Option<usize>,
}

impl Encoder {
    /// Registry with the four built-in codecs in their documented order
    #[must_use]
    pub fn new() -> Self {
        Self::with_codecs(vec![
            Box::new(Json),
            Box::new(Text),
            Box::new(Multipart),
            Box::new(FormEncoded),
        ])
    }

    /// Registry with a caller-chosen codec list; first match wins
    #[must_use]
    pub fn with_codecs(codecs: Vec<Box<dyn Codec>>) -> Self {
        Self {
            codecs,
            max_decoded_size: None,
        }
    }

    /// Cap the size of a response body handed to a codec, measured after
    /// gunzip. Unlimited by default; `HttpClientBuilder::build` sets it from
    /// `HttpClientConfig::max_body_size` when left unset.
    #[must_use]
    pub fn with_max_decoded_size(mut self, limit: usize) -> Self {
        self.max_decoded_size = Some(limit);
        self
    }

    #[must_use]
    pub fn max_decoded_size(&self) -> Option<usize> {
        self.max_decoded_size
    }

    /// Append a codec with the lowest priority
    #[must_use]
    pub fn with_codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codecs.push(Box::new(codec));
        self
    }

    /// Serialize `request.body` according to its `Content-Type`.
    ///
    /// May rewrite the request's `Content-Type` in place (multipart appends
    /// `; boundary=...`). A request without a body encodes to empty bytes,
    /// but still needs a resolvable `Content-Type`.
    ///
    /// # Errors
    /// Returns `EncodingError::UnsupportedEncoding` if `Content-Type` is
    /// missing or unmatched, or the codec's own error.
    pub fn serialize_request(&self, request: &mut HttpRequest) -> Result<Bytes, EncodingError> {
        match &request.body {
            Some(body) => self.serialize(body, &mut request.headers),
            None => {
                let content_type = request_content_type(&request.headers)?;
                self.codec_for_request(content_type)?;
                Ok(Bytes::new())
            }
        }
    }

    /// Serialize a body under the given headers.
    ///
    /// # Errors
    /// See [`Encoder::serialize_request`].
    pub fn serialize(&self, body: &Body, headers: &mut HeaderMap) -> Result<Bytes, EncodingError> {
        let content_type = request_content_type(headers)?;
        let codec = self.codec_for_request(content_type)?;

        let encoded = codec.encode(body, headers, self)?;

        if is_gzip(headers) {
            return gzip(&encoded).map(Bytes::from);
        }
        Ok(Bytes::from(encoded))
    }

    /// Decode a response body according to its `Content-Type`.
    ///
    /// Gunzips first when `Content-Encoding: gzip` is present.
    ///
    /// # Errors
    /// Returns `EncodingError::UnsupportedEncoding` if `Content-Type` is
    /// missing or unmatched, `EncodingError::DecodedTooLarge` if the
    /// (inflated) body exceeds [`Encoder::max_decoded_size`], or the codec's
    /// own error.
    pub fn deserialize_response(
        &self,
        body: &[u8],
        headers: &HeaderMap,
    ) -> Result<Value, EncodingError> {
        let content_type = header_str(headers, &CONTENT_TYPE)
            .ok_or_else(|| {
                EncodingError::unsupported("HttpResponse did not have Content-Type header set")
            })?
            .to_ascii_lowercase();

        let codec = self.codec_for(&content_type).ok_or_else(|| {
            EncodingError::unsupported(format!(
                "Unable to deserialize response with Content-Type {content_type}. Supported decodings are {}",
                format_patterns(&self.supported_decodings())
            ))
        })?;

        if is_gzip(headers) {
            let inflated = gunzip(body, self.max_decoded_size)?;
            return codec.decode(&inflated);
        }
        if let Some(limit) = self.max_decoded_size
            && body.len() > limit
        {
            return Err(EncodingError::DecodedTooLarge {
                limit,
                actual: body.len(),
            });
        }
        codec.decode(body)
    }

    /// Pattern descriptions of every registered codec, in priority order
    #[must_use]
    pub fn supported_encodings(&self) -> Vec<String> {
        self.codecs
            .iter()
            .map(|codec| codec.content_type().to_string())
            .collect()
    }

    /// Same registry as [`Encoder::supported_encodings`]; codecs that cannot
    /// decode still match and then refuse
    #[must_use]
    pub fn supported_decodings(&self) -> Vec<String> {
        self.supported_encodings()
    }

    fn codec_for(&self, content_type: &str) -> Option<&dyn Codec> {
        let codec: Option<&dyn Codec> = self
            .codecs
            .iter()
            .find(|codec| codec.content_type().matches(content_type))
            .map(|codec| &**codec);
        if let Some(codec) = codec {
            tracing::trace!(content_type, codec = codec.name(), "selected codec");
        }
        codec
    }

    fn codec_for_request(&self, content_type: &str) -> Result<&dyn Codec, EncodingError> {
        self.codec_for(content_type).ok_or_else(|| {
            EncodingError::unsupported(format!(
                "Unable to serialize request with Content-Type {content_type}. Supported encodings are {}",
                format_patterns(&self.supported_encodings())
            ))
        })
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field(
                "codecs",
                &self.codecs.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("max_decoded_size", &self.max_decoded_size)
            .finish()
    }
}

fn request_content_type(headers: &HeaderMap) -> Result<&str, EncodingError> {
    header_str(headers, &CONTENT_TYPE)
        .ok_or_else(|| EncodingError::unsupported("HttpRequest did not have Content-Type header set"))
}

/// First value of a header; non-text values count as absent
fn header_str<'a>(headers: &'a HeaderMap, name: &http::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .is_some_and(|value| value == "gzip")
}

fn format_patterns(patterns: &[String]) -> String {
    format!("[{}]", patterns.join(", "))
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(EncodingError::Gzip)?;
    encoder.finish().map_err(EncodingError::Gzip)
}

/// Inflate at most `limit + 1` bytes so an oversized stream is detected
/// without buffering all of it.
fn gunzip(data: &[u8], limit: Option<usize>) -> Result<Vec<u8>, EncodingError> {
    let mut decoded = Vec::new();
    let decoder = GzDecoder::new(data);
    match limit {
        Some(limit) => {
            let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
            decoder
                .take(cap)
                .read_to_end(&mut decoded)
                .map_err(EncodingError::Gzip)?;
            if decoded.len() > limit {
                return Err(EncodingError::DecodedTooLarge {
                    limit,
                    actual: decoded.len(),
                });
            }
        }
        None => {
            let mut decoder = decoder;
            decoder
                .read_to_end(&mut decoded)
                .map_err(EncodingError::Gzip)?;
        }
    }
    Ok(decoded)
}

/// Wire form of a plain form/multipart value.
///
/// Strings are emitted without quotes and `null` as the empty string; any
/// other value uses its JSON text.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
