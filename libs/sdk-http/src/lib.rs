#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Request/response pipeline for generated API SDKs
//!
//! SDK code describes a call as an [`HttpRequest`] (verb, path, headers and
//! an optional [`Body`]) and hands it to [`HttpClient::execute`], which:
//! - runs the registered [`Injector`]s (authentication and similar)
//! - applies a default `User-Agent`
//! - serializes the body with the codec selected by `Content-Type`
//!   (JSON, `text/*`, `multipart/*`, form-urlencoded), optionally gzipped
//! - sends it through a [`Transport`] (hyper + rustls by default)
//! - decodes the response body the same way
//! - maps statuses outside `[200, 300)` to [`HttpError::Status`], which
//!   carries the decoded body just like a successful [`HttpResponse`]
//!
//! Decoded bodies are schemaless [`serde_json::Value`] trees; use indexing
//! for ad-hoc access or [`HttpResponse::json`] for typed extraction.
//!
//! # Example
//!
//! ```ignore
//! use sdk_http::{Form, FilePart, FormPart, HttpClient, HttpRequest, StaticEnvironment};
//! use serde_json::json;
//!
//! let client = HttpClient::builder(StaticEnvironment::new("https://api.example.com")).build()?;
//!
//! let upload = HttpRequest::post("/v1/documents")
//!     .header("content-type", "multipart/form-data")?
//!     .body(
//!         Form::new()
//!             .text("title", "Quarterly report")
//!             .part("meta", FormPart::new(json!({"tags": ["q3"]}), [("content-type", "application/json")]))
//!             .file("document", FilePart::from_path("report.pdf")),
//!     );
//!
//! let resp = client.execute(&upload).await?;
//! let id = resp.result().and_then(|r| r["id"].as_str());
//! ```

mod builder;
mod client;
mod config;
pub mod encoder;
mod environment;
mod error;
mod injector;
mod request;
mod response;
mod transport;

pub use builder::HttpClientBuilder;
pub use client::{HttpClient, ResultTransform};
pub use config::{DEFAULT_USER_AGENT, HttpClientConfig, TransportSecurity};
pub use encoder::{Codec, ContentTypePattern, Encoder, FormPart};
pub use environment::{Environment, StaticEnvironment};
pub use error::{EncodingError, HttpError, InvalidUriKind};
pub use injector::{BearerAuthInjector, Injector, TokenSource};
pub use request::{Body, FilePart, Form, FormField, HttpRequest};
pub use response::HttpResponse;
pub use transport::{HyperTransport, Transport};
