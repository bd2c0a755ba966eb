/// Where requests are sent.
///
/// Relative request paths are joined to [`Environment::base_url`]. Generated
/// SDKs usually ship one implementation per deployment region and may carry
/// credentials alongside, which the pipeline never reads.
pub trait Environment: Send + Sync {
    /// Scheme, host and optional path prefix, e.g. `https://api.example.com/v2`
    fn base_url(&self) -> &str;
}

/// An [`Environment`] with a fixed base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticEnvironment {
    base_url: String,
}

impl StaticEnvironment {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Environment for StaticEnvironment {
    fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl<T: Environment + ?Sized> Environment for std::sync::Arc<T> {
    fn base_url(&self) -> &str {
        (**self).base_url()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_static_environment() {
        let env = StaticEnvironment::new("https://api.example.com");
        assert_eq!(env.base_url(), "https://api.example.com");

        let shared: Arc<dyn Environment> = Arc::new(env);
        assert_eq!(shared.base_url(), "https://api.example.com");
    }
}
