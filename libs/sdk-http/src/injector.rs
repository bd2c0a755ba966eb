//! Per-request mutation hooks.
//!
//! Injectors run in registration order on the client's private copy of the
//! request, before the default `User-Agent` is applied and before the body
//! is serialized. Typical use is authentication.

use crate::error::HttpError;
use crate::request::HttpRequest;
use async_trait::async_trait;
use http::HeaderValue;
use http::header::{AUTHORIZATION, HeaderName};
use std::error::Error as StdError;

/// Mutates an outgoing request before it is sent.
///
/// Any `Fn(&mut HttpRequest) + Send + Sync` closure is an injector:
///
/// ```ignore
/// let client = HttpClientBuilder::new(env)
///     .injector(|req: &mut HttpRequest| {
///         req.headers.insert("x-tenant", HeaderValue::from_static("acme"));
///     })
///     .build()?;
/// ```
#[async_trait]
pub trait Injector: Send + Sync {
    /// # Errors
    /// An error aborts `execute` before anything is sent.
    async fn inject(&self, request: &mut HttpRequest) -> Result<(), HttpError>;
}

#[async_trait]
impl<F> Injector for F
where
    F: Fn(&mut HttpRequest) + Send + Sync,
{
    async fn inject(&self, request: &mut HttpRequest) -> Result<(), HttpError> {
        self(request);
        Ok(())
    }
}

/// Supplies access tokens to [`BearerAuthInjector`].
///
/// Acquisition, caching and refresh are the implementor's business; the
/// injector asks for a token on every request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// # Errors
    /// Any error is surfaced to the caller as `HttpError::Injector`.
    async fn access_token(&self) -> Result<String, Box<dyn StdError + Send + Sync>>;
}

/// Sets `Authorization: Bearer <token>` (or a custom header) on every request.
///
/// The header value is marked sensitive so it is redacted from `Debug`
/// output.
#[derive(Clone, Debug)]
pub struct BearerAuthInjector<S> {
    source: S,
    header_name: HeaderName,
}

impl<S: TokenSource> BearerAuthInjector<S> {
    /// Create an injector that sets `Authorization: Bearer <token>`.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            header_name: AUTHORIZATION,
        }
    }

    /// Create an injector that sets `<header_name>: Bearer <token>`.
    #[must_use]
    pub fn with_header_name(source: S, header_name: HeaderName) -> Self {
        Self {
            source,
            header_name,
        }
    }
}

#[async_trait]
impl<S: TokenSource> Injector for BearerAuthInjector<S> {
    async fn inject(&self, request: &mut HttpRequest) -> Result<(), HttpError> {
        let token = self
            .source
            .access_token()
            .await
            .map_err(HttpError::Injector)?;

        let mut value = HeaderValue::try_from(format!("Bearer {token}"))?;
        value.set_sensitive(true);

        request.headers.insert(self.header_name.clone(), value);
        Ok(())
    }
}

/// Fixed token, mostly useful for tests and API keys
#[async_trait]
impl TokenSource for String {
    async fn access_token(&self) -> Result<String, Box<dyn StdError + Send + Sync>> {
        Ok(self.clone())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn access_token(&self) -> Result<String, Box<dyn StdError + Send + Sync>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("tok-{n}"))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl TokenSource for FailingSource {
        async fn access_token(&self) -> Result<String, Box<dyn StdError + Send + Sync>> {
            Err("token endpoint unavailable".into())
        }
    }

    #[tokio::test]
    async fn test_closure_injector() {
        let injector = |req: &mut HttpRequest| {
            req.headers
                .insert("x-custom", HeaderValue::from_static("injected"));
        };

        let mut req = HttpRequest::get("/");
        injector.inject(&mut req).await.unwrap();
        assert_eq!(req.header_str("x-custom"), Some("injected"));
    }

    #[tokio::test]
    async fn test_bearer_injector_sets_sensitive_header() {
        let injector = BearerAuthInjector::new("secret-token".to_owned());

        let mut req = HttpRequest::get("/")
            .header("authorization", "Basic old")
            .unwrap();
        injector.inject(&mut req).await.unwrap();

        let value = req.headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value, "Bearer secret-token");
        assert!(value.is_sensitive());
        assert_eq!(req.headers.get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[tokio::test]
    async fn test_bearer_injector_asks_per_request() {
        let injector = BearerAuthInjector::with_header_name(
            CountingSource {
                calls: AtomicUsize::new(0),
            },
            HeaderName::from_static("x-api-token"),
        );

        let mut first = HttpRequest::get("/");
        let mut second = HttpRequest::get("/");
        injector.inject(&mut first).await.unwrap();
        injector.inject(&mut second).await.unwrap();

        assert_eq!(first.header_str("x-api-token"), Some("Bearer tok-1"));
        assert_eq!(second.header_str("x-api-token"), Some("Bearer tok-2"));
        assert!(first.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_bearer_injector_source_failure() {
        let injector = BearerAuthInjector::new(FailingSource);

        let mut req = HttpRequest::get("/");
        let err = injector.inject(&mut req).await.unwrap_err();

        assert!(matches!(err, HttpError::Injector(_)));
        assert!(err.to_string().contains("token endpoint unavailable"));
        assert!(req.headers.is_empty());
    }

    #[tokio::test]
    async fn test_bearer_injector_rejects_invalid_token() {
        let injector = BearerAuthInjector::new("bad\ntoken".to_owned());

        let mut req = HttpRequest::get("/");
        let err = injector.inject(&mut req).await.unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeaderValue(_)));
    }
}
