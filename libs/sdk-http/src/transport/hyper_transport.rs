use super::Transport;
use crate::config::{HttpClientConfig, TransportSecurity};
use crate::error::HttpError;
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::sync::Arc;
use std::time::Duration;
use tower::timeout::{Timeout, TimeoutLayer};
use tower::{ServiceBuilder, ServiceExt};

type PooledClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Default [`Transport`]: hyper-util's pooled client over rustls.
///
/// - HTTPS through webpki roots and the aws-lc-rs provider (or the process
///   default provider, if one is installed)
/// - HTTP/1.1 and HTTP/2 negotiated via ALPN
/// - per-request timeout through tower's [`TimeoutLayer`]
/// - response bodies buffered up to `max_body_size`
///
/// Plain `http://` URLs are rejected with [`HttpError::InvalidScheme`]
/// unless the config allows insecure HTTP.
#[derive(Clone, Debug)]
pub struct HyperTransport {
    service: Timeout<PooledClient>,
    timeout: Duration,
    max_body_size: usize,
    transport_security: TransportSecurity,
}

impl HyperTransport {
    /// # Errors
    /// Returns `HttpError::Tls` if the TLS connector cannot be initialised.
    pub fn new(config: &HttpClientConfig) -> Result<Self, HttpError> {
        if config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                target: "sdk_http::security",
                "insecure HTTP enabled (TransportSecurity::AllowInsecureHttp); \
                 use only for testing with mock servers"
            );
        }

        let https = build_https_connector(config.transport)?;

        let mut client_builder = Client::builder(TokioExecutor::new());

        // pool_idle_timeout has no effect without a pool timer
        client_builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .http2_only(false);

        if let Some(idle_timeout) = config.pool_idle_timeout {
            client_builder.pool_idle_timeout(idle_timeout);
        }

        let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(config.request_timeout))
            .service(hyper_client);

        Ok(Self {
            service,
            timeout: config.request_timeout,
            max_body_size: config.max_body_size,
            transport_security: config.transport,
        })
    }

    fn check_scheme(&self, uri: &http::Uri) -> Result<(), HttpError> {
        match uri.scheme_str() {
            Some("https") => Ok(()),
            Some("http") => match self.transport_security {
                TransportSecurity::AllowInsecureHttp => Ok(()),
                TransportSecurity::TlsOnly => Err(HttpError::InvalidScheme {
                    scheme: "http".to_owned(),
                    reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                }),
            },
            Some(scheme) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            }),
            None => Err(HttpError::InvalidScheme {
                scheme: String::new(),
                reason: "request URI has no scheme".to_owned(),
            }),
        }
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
        self.check_scheme(request.uri())?;

        let response = self
            .service
            .clone()
            .oneshot(request.map(Full::new))
            .await
            .map_err(|e| map_tower_error(e, self.timeout))?;

        read_body_limited(response, self.max_body_size).await
    }
}

/// Map tower errors to `HttpError` with actual timeout duration
fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }

    match err.downcast::<hyper_util::client::legacy::Error>() {
        Ok(client_err) => HttpError::from(*client_err),
        Err(other) => HttpError::Transport(other),
    }
}

/// Buffer the body, failing as soon as more than `limit` bytes arrived
async fn read_body_limited(
    response: Response<Incoming>,
    limit: usize,
) -> Result<Response<Bytes>, HttpError> {
    let (parts, body) = response.into_parts();

    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = frame?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Response::from_parts(parts, Bytes::from(collected)))
}

/// Use the process-wide rustls provider when one is installed, aws-lc-rs otherwise
fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

fn build_https_connector(
    transport: TransportSecurity,
) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let builder = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(crypto_provider())
        .map_err(|e| HttpError::Tls(Box::new(e)))?;

    let connector = match transport {
        TransportSecurity::AllowInsecureHttp => builder.https_or_http().enable_all_versions().build(),
        TransportSecurity::TlsOnly => builder.https_only().enable_all_versions().build(),
    };
    Ok(connector)
}
