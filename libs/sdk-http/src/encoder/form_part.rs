use crate::request::Body;

/// A multipart field with its own headers.
///
/// Header names are normalised to Header-Case when the part is built, so
/// `content-type` and `CONTENT-TYPE` are both emitted as `Content-Type`.
/// When a `Content-Type` is present the value is serialized through the
/// encoder under that type, which is how a JSON document is embedded in a
/// multipart body.
#[derive(Clone, Debug, PartialEq)]
pub struct FormPart {
    value: Body,
    headers: Vec<(String, String)>,
}

impl FormPart {
    pub fn new<I, K, V>(value: impl Into<Body>, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut normalized: Vec<(String, String)> = Vec::new();
        for (name, value) in headers {
            let name = header_case(name.as_ref());
            let value = value.into();
            match normalized.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value,
                None => normalized.push((name, value)),
            }
        }
        Self {
            value: value.into(),
            headers: normalized,
        }
    }

    #[must_use]
    pub fn value(&self) -> &Body {
        &self.value
    }

    /// Headers in Header-Case, in insertion order
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of the part's own `Content-Type` header
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name == "Content-Type")
            .map(|(_, value)| value.as_str())
    }
}

/// `x-request-ID` -> `X-Request-Id`
fn header_case(name: &str) -> String {
    name.to_ascii_lowercase()
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
