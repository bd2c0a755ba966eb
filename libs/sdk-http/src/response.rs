use crate::error::{EncodingError, HttpError};
use http::header::{AsHeaderName, HeaderMap};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decoded response returned by
/// [`HttpClient::execute`](crate::HttpClient::execute).
///
/// The same type is carried by [`HttpError::Status`], so an error body can be
/// inspected exactly like a successful one.
///
/// `result` is `None` when the server sent no body. Otherwise it is the value
/// decoded by the codec matching the response `Content-Type`: JSON documents
/// keep their structure, text bodies become a string.
///
/// # Example
///
/// ```ignore
/// let resp = client.execute(&request).await?;
/// let name = resp.result().and_then(|r| r["nested"]["name"].as_str());
/// let typed: Widget = resp.json()?;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    status_code: StatusCode,
    result: Option<Value>,
    headers: HeaderMap,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status_code: StatusCode, result: Option<Value>, headers: HeaderMap) -> Self {
        Self {
            status_code,
            result,
            headers,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// True for statuses in `[200, 300)`
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code.is_success()
    }

    /// Decoded body, `None` for an empty body
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Response headers; lookups are case-insensitive and repeated headers
    /// keep every value
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// All values of a header that are valid UTF-8, in arrival order
    #[must_use]
    pub fn header_values(&self, name: impl AsHeaderName) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    #[must_use]
    pub fn into_result(self) -> Option<Value> {
        self.result
    }

    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Option<Value>, HeaderMap) {
        (self.status_code, self.result, self.headers)
    }

    /// Deserialize the decoded result into a typed value.
    ///
    /// An empty body is presented to `T` as JSON `null`, so `Option<T>` and
    /// `()` accept it.
    ///
    /// # Errors
    /// Returns `EncodingError::Json` if the result does not fit `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let value = self.result.clone().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(EncodingError::from)
            .map_err(HttpError::from)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde::Deserialize;
    use serde_json::json;

    fn response(result: Option<Value>) -> HttpResponse {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        HttpResponse::new(StatusCode::OK, result, headers)
    }

    #[test]
    fn test_nested_field_access() {
        let resp = response(Some(json!({
            "string": "value",
            "nested": {"nested_string": "nested_value", "nested_array": [1, 2, 3]}
        })));

        let result = resp.result().unwrap();
        assert_eq!(result["string"], "value");
        assert_eq!(result["nested"]["nested_string"], "nested_value");
        assert_eq!(result.pointer("/nested/nested_array/2"), Some(&json!(3)));
        assert!(resp.is_success());
    }

    #[test]
    fn test_repeated_headers_are_kept() {
        let resp = response(None);
        assert_eq!(resp.header_values("Set-Cookie"), ["a=1", "b=2"]);
        assert_eq!(resp.header_values("x-missing"), Vec::<&str>::new());
    }

    #[test]
    fn test_typed_extraction() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Widget {
            name: String,
            sizes: Vec<u32>,
        }

        let resp = response(Some(json!({"name": "bolt", "sizes": [4, 6], "extra": true})));
        let widget: Widget = resp.json().unwrap();
        assert_eq!(
            widget,
            Widget {
                name: "bolt".to_owned(),
                sizes: vec![4, 6],
            }
        );
    }

    #[test]
    fn test_typed_extraction_of_empty_body() {
        let resp = response(None);
        let value: Option<String> = resp.json().unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_typed_extraction_mismatch() {
        let resp = response(Some(json!("just text")));
        let err = resp.json::<Vec<u32>>().unwrap_err();
        assert!(matches!(err, HttpError::Encoding(EncodingError::Json(_))));
    }

    #[test]
    fn test_into_parts() {
        let (status, result, headers) = response(Some(json!([1]))).into_parts();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result, Some(json!([1])));
        assert_eq!(headers.get_all("set-cookie").iter().count(), 2);
    }
}
