use crate::builder::HttpClientBuilder;
use crate::encoder::Encoder;
use crate::environment::Environment;
use crate::error::{EncodingError, HttpError, InvalidUriKind};
use crate::injector::Injector;
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use crate::transport::Transport;
use bytes::Bytes;
use http::HeaderValue;
use http::header::USER_AGENT;
use serde_json::Value;
use std::sync::Arc;

/// Hook applied to every decoded response body
pub type ResultTransform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

pub(crate) struct ClientInner {
    pub(crate) environment: Arc<dyn Environment>,
    pub(crate) encoder: Encoder,
    pub(crate) injectors: Vec<Box<dyn Injector>>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) user_agent: HeaderValue,
    pub(crate) result_transform: Option<ResultTransform>,
}

/// Request/response pipeline shared by generated API SDKs.
///
/// Each [`execute`](HttpClient::execute) call:
/// 1. copies the request, so the caller's value is never touched
/// 2. runs every injector in registration order
/// 3. sets `User-Agent` if the request has none
/// 4. serializes the body (if any) through the [`Encoder`]
/// 5. sends it through the [`Transport`] against the environment's base URL
/// 6. decodes a non-empty response body through the [`Encoder`]
/// 7. returns the response for a 2xx status, [`HttpError::Status`] otherwise
///
/// The client is cheap to clone and safe to share across tasks; clones share
/// the codecs, injectors and transport.
///
/// # Example
///
/// ```ignore
/// use sdk_http::{HttpClient, HttpRequest, StaticEnvironment};
///
/// let client = HttpClient::builder(StaticEnvironment::new("https://api.example.com")).build()?;
///
/// let request = HttpRequest::post("/v1/widgets")
///     .header("content-type", "application/json")?
///     .body(json!({"name": "bolt"}));
///
/// match client.execute(&request).await {
///     Ok(resp) => println!("created {}", resp.result().unwrap_or(&Value::Null)["id"]),
///     Err(HttpError::Status(resp)) => eprintln!("rejected: {:?}", resp.result()),
///     Err(e) => return Err(e.into()),
/// }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl HttpClient {
    /// Create a builder for the given environment
    #[must_use]
    pub fn builder(environment: impl Environment + 'static) -> HttpClientBuilder {
        HttpClientBuilder::new(environment)
    }

    /// The codec registry, for SDK code that serializes out of band
    #[must_use]
    pub fn encoder(&self) -> &Encoder {
        &self.inner.encoder
    }

    /// Send a request and decode the response.
    ///
    /// # Errors
    /// - `HttpError::Status` when the server answered outside `[200, 300)`;
    ///   the error carries the decoded body and headers
    /// - `HttpError::Encoding` when the request body cannot be serialized or
    ///   the response body cannot be decoded
    /// - `HttpError::Injector` (or any error an injector returns)
    /// - `HttpError::InvalidUri` when the resolved URL is malformed
    /// - `HttpError::BodyTooLarge` when the gunzipped response body exceeds
    ///   the encoder's decoded-size cap
    /// - transport errors, unchanged from the [`Transport`]
    pub async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let inner = &self.inner;
        let mut request = request.clone();

        for injector in &inner.injectors {
            injector.inject(&mut request).await?;
        }

        if !request.headers.contains_key(USER_AGENT) {
            request
                .headers
                .insert(USER_AGENT, inner.user_agent.clone());
        }

        let body = if request.body.is_some() {
            inner.encoder.serialize_request(&mut request)?
        } else {
            Bytes::new()
        };

        let uri = resolve_url(inner.environment.base_url(), &request.path)?;

        tracing::debug!(
            method = %request.verb,
            url = %uri,
            injectors = inner.injectors.len(),
            body_len = body.len(),
            "sending request"
        );

        let mut raw = http::Request::new(body);
        *raw.method_mut() = request.verb;
        *raw.uri_mut() = uri;
        *raw.headers_mut() = request.headers;

        let (parts, body) = inner.transport.send(raw).await?.into_parts();

        tracing::debug!(status = parts.status.as_u16(), body_len = body.len(), "received response");

        let result = if body.is_empty() {
            None
        } else {
            let value = inner
                .encoder
                .deserialize_response(&body, &parts.headers)
                .map_err(|err| match err {
                    EncodingError::DecodedTooLarge { limit, actual } => {
                        HttpError::BodyTooLarge { limit, actual }
                    }
                    other => HttpError::Encoding(other),
                })?;
            Some(match &inner.result_transform {
                Some(transform) => transform(value),
                None => value,
            })
        };

        let response = HttpResponse::new(parts.status, result, parts.headers);
        if response.is_success() {
            Ok(response)
        } else {
            Err(HttpError::Status(Box::new(response)))
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.environment.base_url())
            .field("encoder", &self.inner.encoder)
            .field("injectors", &self.inner.injectors.len())
            .field("user_agent", &self.inner.user_agent)
            .field("result_transform", &self.inner.result_transform.is_some())
            .finish_non_exhaustive()
    }
}

/// `scheme://...` paths are used as-is; anything else is appended to the
/// base URL with exactly one `/` in between.
fn resolve_url(base_url: &str, path: &str) -> Result<http::Uri, HttpError> {
    let url = if is_absolute(path) {
        path.to_owned()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };

    let uri: http::Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
            url: url.clone(),
            kind: InvalidUriKind::ParseError,
            reason: e.to_string(),
        })?;

    if uri.authority().is_none() {
        return Err(HttpError::InvalidUri {
            url,
            kind: InvalidUriKind::MissingAuthority,
            reason: "missing host/authority".to_owned(),
        });
    }
    if uri.scheme().is_none() {
        return Err(HttpError::InvalidUri {
            url,
            kind: InvalidUriKind::MissingScheme,
            reason: "missing scheme".to_owned(),
        });
    }
    Ok(uri)
}

fn is_absolute(path: &str) -> bool {
    path.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}


#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod mock_server_tests {
    use super::*;
    use crate::environment::StaticEnvironment;
    use crate::request::{FilePart, Form};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use http::StatusCode;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::io::Write;

    fn test_client(server: &MockServer) -> HttpClient {
        HttpClient::builder(StaticEnvironment::new(server.base_url()))
            .allow_insecure_http()
            .build()
            .unwrap()
    }

    fn gzip_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/widgets")
                .header("content-type", "application/json")
                .header("user-agent", "SdkHttp-Rust HTTP/1.1")
                .body(r#"{"name":"bolt","size":4}"#);
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"{"id":"w-1","nested":{"ok":true}}"#);
        });

        let request = HttpRequest::post("/v1/widgets")
            .header("content-type", "application/json")
            .unwrap()
            .body(json!({"name": "bolt", "size": 4}));
        let resp = test_client(&server).execute(&request).await.unwrap();

        m.assert();
        assert_eq!(resp.status_code(), StatusCode::CREATED);
        assert_eq!(resp.result().unwrap()["nested"]["ok"], true);
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, b"PNG-bytes").unwrap();

        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .header_exists("content-type")
                .body_includes("Content-Disposition: form-data; name=\"title\"\r\n\r\nLogo\r\n")
                .body_includes("Content-Disposition: form-data; name=\"file\"; filename=\"logo.png\"\r\nContent-Type: image/png\r\n");
            then.status(200)
                .header("content-type", "text/plain")
                .body("stored");
        });

        let request = HttpRequest::post("/upload")
            .header("content-type", "multipart/form-data")
            .unwrap()
            .body(
                Form::new()
                    .file("file", FilePart::from_path(&path))
                    .text("title", "Logo"),
            );
        let resp = test_client(&server).execute(&request).await.unwrap();

        m.assert();
        assert_eq!(resp.result(), Some(&json!("stored")));
    }

    #[tokio::test]
    async fn test_gzip_request_and_response() {
        let server = MockServer::start();
        let compressed = gzip_compress(br#"{"items":[1,2,3]}"#);
        let m = server.mock(|when, then| {
            when.method(PUT)
                .path("/compressed")
                .header("content-encoding", "gzip");
            then.status(200)
                .header("content-type", "application/json")
                .header("content-encoding", "gzip")
                .body(compressed);
        });

        let request = HttpRequest::put("/compressed")
            .header("content-type", "application/json")
            .unwrap()
            .header("content-encoding", "gzip")
            .unwrap()
            .body(json!({"a": 1}));
        let resp = test_client(&server).execute(&request).await.unwrap();

        m.assert();
        assert_eq!(resp.result(), Some(&json!({"items": [1, 2, 3]})));
    }

    #[tokio::test]
    async fn test_gzip_response_capped_after_decompression() {
        let server = MockServer::start();
        let compressed = gzip_compress(&vec![b'a'; 4 * 1024 * 1024]);
        assert!(compressed.len() < 64 * 1024);

        server.mock(|when, then| {
            when.method(GET).path("/v1/bomb");
            then.status(200)
                .header("content-type", "text/plain")
                .header("content-encoding", "gzip")
                .body(compressed);
        });

        let client = HttpClient::builder(StaticEnvironment::new(server.base_url()))
            .allow_insecure_http()
            .max_body_size(64 * 1024)
            .build()
            .unwrap();

        let err = client
            .execute(&HttpRequest::get("/v1/bomb"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, HttpError::BodyTooLarge { limit: 65536, .. }),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_error_status_with_body() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404)
                .header("content-type", "application/json")
                .header("x-request-id", "r-1")
                .body(r#"{"error":"not found"}"#);
        });

        let err = test_client(&server)
            .execute(&HttpRequest::get("/missing"))
            .await
            .unwrap_err();

        let resp = err.as_response().unwrap();
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(resp.result().unwrap()["error"], "not found");
        assert_eq!(resp.header_values("X-Request-Id"), ["r-1"]);
    }
}
