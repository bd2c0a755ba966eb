use crate::client::{ClientInner, HttpClient, ResultTransform};
use crate::config::{HttpClientConfig, TransportSecurity};
use crate::encoder::Encoder;
use crate::environment::Environment;
use crate::error::HttpError;
use crate::injector::Injector;
use crate::transport::{HyperTransport, Transport};
use http::HeaderValue;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Builder for constructing an [`HttpClient`].
///
/// Everything except the environment is optional. Without an explicit
/// transport, `build()` creates a [`HyperTransport`] from the accumulated
/// [`HttpClientConfig`].
///
/// ```ignore
/// let client = HttpClient::builder(StaticEnvironment::new("https://api.example.com"))
///     .timeout(Duration::from_secs(10))
///     .injector(BearerAuthInjector::new(token_source))
///     .build()?;
/// ```
pub struct HttpClientBuilder {
    environment: Arc<dyn Environment>,
    config: HttpClientConfig,
    transport: Option<Arc<dyn Transport>>,
    encoder: Encoder,
    injectors: Vec<Box<dyn Injector>>,
    result_transform: Option<ResultTransform>,
}

impl HttpClientBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new(environment: impl Environment + 'static) -> Self {
        Self::with_environment(Arc::new(environment))
    }

    /// Create a builder around an already shared environment
    #[must_use]
    pub fn with_environment(environment: Arc<dyn Environment>) -> Self {
        Self {
            environment,
            config: HttpClientConfig::default(),
            transport: None,
            encoder: Encoder::new(),
            injectors: Vec::new(),
            result_transform: None,
        }
    }

    /// Replace the whole configuration
    #[must_use]
    pub fn config(mut self, config: HttpClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the per-request timeout of the default transport
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the user agent applied to requests that carry none
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the maximum response body size, enforced by the default transport
    /// on the wire and by the encoder after gunzip
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Let the default transport dial plain `http` URLs, for mock servers
    ///
    /// Compiled only in debug builds or with the `allow-insecure-http`
    /// feature, and logs a warning every time it is called.
    #[must_use]
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        tracing::warn!(
            target: "sdk_http::security",
            "allow_insecure_http() called - HTTP traffic will NOT be encrypted"
        );
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Use a custom transport instead of the default [`HyperTransport`]
    ///
    /// Transport-related config (timeout, pool, security) is then ignored;
    /// `max_body_size` still caps gunzipped response bodies.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Replace the codec registry
    #[must_use]
    pub fn encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Register an injector; injectors run in registration order
    #[must_use]
    pub fn injector(mut self, injector: impl Injector + 'static) -> Self {
        self.injectors.push(Box::new(injector));
        self
    }

    /// Post-process every decoded response body before status mapping
    #[must_use]
    pub fn result_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.result_transform = Some(Arc::new(transform));
        self
    }

    /// Build the client
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the user agent is not a
    /// valid header value, or `HttpError::Tls` if the default transport
    /// cannot initialise TLS.
    pub fn build(self) -> Result<HttpClient, HttpError> {
        let user_agent = HeaderValue::try_from(self.config.user_agent.as_str())?;

        let encoder = if self.encoder.max_decoded_size().is_some() {
            self.encoder
        } else {
            self.encoder.with_max_decoded_size(self.config.max_body_size)
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::new(&self.config)?),
        };

        tracing::debug!(
            base_url = self.environment.base_url(),
            injectors = self.injectors.len(),
            codecs = ?encoder.supported_encodings(),
            "built sdk http client"
        );

        Ok(HttpClient {
            inner: Arc::new(ClientInner {
                environment: self.environment,
                encoder,
                injectors: self.injectors,
                transport,
                user_agent,
                result_transform: self.result_transform,
            }),
        })
    }
}
