//! The network round-trip behind [`HttpClient`](crate::HttpClient).
//!
//! The pipeline hands a transport a fully serialized request whose URI is
//! already resolved against the environment's base URL, and expects the
//! buffered response back. Connection handling, TLS, timeouts and body
//! limits all live here; errors pass through `execute` unchanged.

mod hyper_transport;

pub use hyper_transport::HyperTransport;

use crate::error::HttpError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round-trip.
    ///
    /// Any status code is a successful round-trip; mapping non-2xx statuses
    /// to errors is the client's job.
    ///
    /// # Errors
    /// Transport-level failures: connection, TLS, timeout, body limit.
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, HttpError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, HttpError> {
        (**self).send(request).await
    }
}
