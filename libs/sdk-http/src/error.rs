use crate::response::HttpResponse;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Classification of URL resolution failures.
///
/// Provides programmatic matching for different failure modes without
/// relying on unstable error message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// URL could not be parsed (malformed syntax)
    ParseError,
    /// URL is missing required host/authority component
    MissingAuthority,
    /// URL is missing required scheme (http/https)
    MissingScheme,
}

/// Errors raised while turning bodies into bytes and back.
///
/// All of these are raised before any network activity (serialization) or
/// after the round-trip completed (deserialization); they indicate a
/// programmer or configuration error rather than a server failure.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EncodingError {
    /// Missing `Content-Type`, no codec for it, or a codec that cannot decode
    #[error("{0}")]
    UnsupportedEncoding(String),

    /// The body variant cannot be represented by the selected codec
    #[error("{codec} cannot encode a {found} body; expected {expected}")]
    InvalidBody {
        codec: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// JSON serialization or parsing error
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Gzip compression or decompression failed
    #[error("gzip stream failed: {0}")]
    Gzip(#[source] std::io::Error),

    /// A response body grew past the configured limit once decoded
    #[error("decoded body exceeds {limit} bytes (read {actual})")]
    DecodedTooLarge { limit: usize, actual: usize },

    /// A multipart file could not be read
    #[error("failed to read file '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoder produced a header value that is not valid on the wire
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
}

impl EncodingError {
    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedEncoding(message.into())
    }

    /// Returns true for the `UnsupportedEncoding` family of failures
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedEncoding(_))
    }
}

/// HTTP client error types
///
/// Three families matter to callers:
/// - [`HttpError::Status`]: the server answered with a non-2xx status.
/// - [`HttpError::Encoding`]: the request or response payload could not be
///   encoded/decoded; raised before or after the round-trip.
/// - everything else: transport-level failures (the operation did not
///   complete), returned unchanged from the [`Transport`](crate::Transport).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// Non-2xx status, carrying the decoded body and headers
    #[error("HTTP {}", .0.status_code())]
    Status(Box<HttpResponse>),

    /// Body serialization or deserialization failed
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Invalid header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// An injector refused to prepare the request
    #[error("Injector failed: {0}")]
    Injector(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request attempt timed out
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport error (network, connection, etc)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body exceeded size limit, on the wire or after gunzip
    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// Invalid URL (failed to parse)
    ///
    /// Use the `kind` field for programmatic matching. The `reason` field contains
    /// a diagnostic message intended for logging only.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri {
        url: String,
        kind: InvalidUriKind,
        reason: String,
    },

    /// Invalid URL scheme for transport security configuration
    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme { scheme: String, reason: String },
}

impl HttpError {
    /// True when the server responded with a non-2xx status
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status(_))
    }

    /// Status code of a [`HttpError::Status`] failure
    #[must_use]
    pub fn status_code(&self) -> Option<http::StatusCode> {
        self.as_response().map(HttpResponse::status_code)
    }

    /// The full response behind a [`HttpError::Status`] failure
    #[must_use]
    pub fn as_response(&self) -> Option<&HttpResponse> {
        match self {
            Self::Status(response) => Some(response),
            _ => None,
        }
    }

    /// True for `Content-Type` / codec failures
    #[must_use]
    pub fn is_unsupported_encoding(&self) -> bool {
        matches!(self, Self::Encoding(e) if e.is_unsupported())
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}
