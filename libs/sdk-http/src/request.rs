use crate::encoder::FormPart;
use crate::error::{EncodingError, HttpError};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Request body accepted by the [`Encoder`](crate::Encoder).
///
/// Which variants a codec accepts depends on the codec; see the codec docs.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Raw text, emitted verbatim by the text codec
    Text(String),
    /// Structured value (map, list or scalar)
    Json(Value),
    /// Ordered fields for form-urlencoded and multipart bodies
    Form(Form),
    /// File-like binary payload
    File(FilePart),
}

impl Body {
    /// Short variant label used in error messages
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Body::Text(_) => "text",
            Body::Json(_) => "json",
            Body::Form(_) => "form",
            Body::File(_) => "file",
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_owned())
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<Form> for Body {
    fn from(value: Form) -> Self {
        Body::Form(value)
    }
}

impl From<FilePart> for Body {
    fn from(value: FilePart) -> Self {
        Body::File(value)
    }
}

/// One field of a [`Form`]
#[derive(Clone, Debug, PartialEq)]
pub enum FormField {
    /// Plain value, stringified on the wire
    Value(Value),
    /// Field with its own headers (e.g. an embedded JSON document)
    Part(FormPart),
    /// File upload
    File(FilePart),
}

/// Ordered key/value body for `application/x-www-form-urlencoded` and
/// `multipart/*` requests.
///
/// # Example
///
/// ```ignore
/// let form = Form::new()
///     .text("key", "value")
///     .value("another_key", 1013)
///     .part("input", FormPart::new(json!({"key": "val"}), [("content-type", "application/json")]))
///     .file("readme", FilePart::from_path("README.md"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Form {
    fields: Vec<(String, FormField)>,
}

impl Form {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append any field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: FormField) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, FormField::Value(Value::String(value.into())))
    }

    /// Append a plain value (numbers, booleans, strings)
    #[must_use]
    pub fn value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(name, FormField::Value(value.into()))
    }

    #[must_use]
    pub fn part(self, name: impl Into<String>, part: FormPart) -> Self {
        self.field(name, FormField::Part(part))
    }

    #[must_use]
    pub fn file(self, name: impl Into<String>, file: FilePart) -> Self {
        self.field(name, FormField::File(file))
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormField)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Form {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Form::new(), |form, (name, value)| form.value(name, value))
    }
}

#[derive(Clone, Debug, PartialEq)]
enum FileSource {
    Path(PathBuf),
    Memory(Bytes),
}

/// File handed to the multipart codec.
///
/// Path-backed files are opened, read in full and closed while the request
/// is being serialized; nothing is held open between calls.
#[derive(Clone, Debug, PartialEq)]
pub struct FilePart {
    file_name: String,
    source: FileSource,
}

impl FilePart {
    /// File on disk; its base name becomes the multipart `filename`
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_name,
            source: FileSource::Path(path),
        }
    }

    /// In-memory contents presented under `file_name`
    #[must_use]
    pub fn from_bytes(file_name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            source: FileSource::Memory(contents.into()),
        }
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Backing path, if the file lives on disk
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Path(path) => Some(path),
            FileSource::Memory(_) => None,
        }
    }

    /// Read the full contents.
    ///
    /// # Errors
    /// Returns `EncodingError::File` if a path-backed file cannot be read.
    pub fn read(&self) -> Result<Bytes, EncodingError> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => {
                std::fs::read(path)
                    .map(Bytes::from)
                    .map_err(|source| EncodingError::File {
                        path: path.clone(),
                        source,
                    })
            }
        }
    }
}

/// Outgoing request as supplied by SDK code.
///
/// [`HttpClient::execute`](crate::HttpClient::execute) only ever borrows a
/// request; injectors and codecs operate on a private copy.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub verb: http::Method,
    /// Relative to the environment's base URL, or absolute
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(verb: http::Method, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(http::Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(http::Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(http::Method::PUT, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(http::Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(http::Method::DELETE, path)
    }

    /// Set a header, replacing earlier values under the same name
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderName` or `HttpError::InvalidHeaderValue`
    /// if either part is not valid on the wire.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add a header value without removing existing ones
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderName` or `HttpError::InvalidHeaderValue`
    /// if either part is not valid on the wire.
    pub fn append_header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body from any serializable value.
    ///
    /// Does not touch `Content-Type`; set it explicitly, the encoder refuses
    /// requests without one.
    ///
    /// # Errors
    /// Returns `EncodingError::Json` if the value cannot be represented as JSON.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, HttpError> {
        let value = serde_json::to_value(body).map_err(EncodingError::from)?;
        self.body = Some(Body::Json(value));
        Ok(self)
    }

    /// First value of a header, if present and valid UTF-8
    #[must_use]
    pub fn header_str(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = HttpRequest::post("/v1/api")
            .header("Content-Type", "application/json")
            .unwrap();

        assert_eq!(req.header_str("content-type"), Some("application/json"));
        assert_eq!(req.header_str("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_append_header_keeps_all_values() {
        let req = HttpRequest::get("/")
            .append_header("x-tag", "one")
            .unwrap()
            .append_header("X-Tag", "two")
            .unwrap();

        let values: Vec<_> = req.headers.get_all("x-tag").iter().collect();
        assert_eq!(values, ["one", "two"]);
        assert_eq!(req.header_str("x-tag"), Some("one"));
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let result = HttpRequest::get("/").header("x-bad", "line\nbreak");
        assert!(matches!(result, Err(HttpError::InvalidHeaderValue(_))));
    }

    #[test]
    fn test_json_body_from_serializable() {
        #[derive(Serialize)]
        struct Payload {
            name: &'static str,
            count: u32,
        }

        let req = HttpRequest::post("/")
            .json(&Payload {
                name: "widget",
                count: 3,
            })
            .unwrap();

        assert_eq!(req.body, Some(Body::Json(json!({"name": "widget", "count": 3}))));
    }

    #[test]
    fn test_form_preserves_insertion_order() {
        let form = Form::new()
            .file("upload", FilePart::from_bytes("a.png", &b"png"[..]))
            .text("key", "value")
            .value("n", 7);

        let names: Vec<_> = form.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["upload", "key", "n"]);
        assert_eq!(form.len(), 3);
    }

    #[test]
    fn test_form_from_pairs() {
        let form: Form = [("a", json!(1)), ("b", json!("two"))].into_iter().collect();
        let mut fields = form.iter();
        assert_eq!(fields.next(), Some(("a", &FormField::Value(json!(1)))));
        assert_eq!(fields.next(), Some(("b", &FormField::Value(json!("two")))));
    }

    #[test]
    fn test_file_part_from_path_uses_base_name() {
        let file = FilePart::from_path("/tmp/uploads/report.PDF");
        assert_eq!(file.file_name(), "report.PDF");
        assert_eq!(file.path(), Some(Path::new("/tmp/uploads/report.PDF")));
    }

    #[test]
    fn test_file_part_read_missing_file() {
        let file = FilePart::from_path("/definitely/not/here.bin");
        assert!(matches!(file.read(), Err(EncodingError::File { .. })));
    }

    #[test]
    fn test_file_part_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"contents").unwrap();

        let file = FilePart::from_path(&path);
        assert_eq!(file.read().unwrap(), Bytes::from_static(b"contents"));
    }
}
