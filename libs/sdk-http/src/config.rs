use std::time::Duration;

/// `User-Agent` applied to requests that do not carry one
pub const DEFAULT_USER_AGENT: &str = "SdkHttp-Rust HTTP/1.1";

/// URL schemes the default transport will dial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// `https` only
    #[default]
    TlsOnly,
    /// `https` and plain `http`
    ///
    /// Meant for SDK tests pointed at a local mock server. Request bodies,
    /// bearer tokens and responses travel unencrypted.
    AllowInsecureHttp,
}

/// Settings consumed by [`HttpClientBuilder::build`](crate::HttpClientBuilder::build).
///
/// `user_agent` and `max_body_size` always apply. The rest only shape the
/// default [`HyperTransport`](crate::HyperTransport) and have no effect on a
/// custom transport.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Sent when the request has no `User-Agent` of its own
    pub user_agent: String,

    /// Upper bound on one round-trip, connect included
    pub request_timeout: Duration,

    /// Largest response body accepted, in bytes
    ///
    /// Checked twice: against the bytes read from the socket, and again
    /// against the inflated body when the response is gzipped.
    pub max_body_size: usize,

    /// Which schemes may be dialed
    pub transport: TransportSecurity,

    /// How long an unused pooled connection is kept; `None` keeps
    /// hyper-util's own default
    pub pool_idle_timeout: Option<Duration>,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    /// 30s timeout, 10 MiB bodies, TLS only, 32 idle connections per host
    /// kept for 90s.
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024,
            transport: TransportSecurity::TlsOnly,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }
}

impl HttpClientConfig {
    /// Tighter settings for SDKs making a few small calls: 10s timeout,
    /// 1 MiB bodies, at most 8 idle connections per host.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_body_size: 1024 * 1024,
            pool_idle_timeout: Some(Duration::from_secs(30)),
            pool_max_idle_per_host: 8,
            ..Self::default()
        }
    }

    /// [`minimal`](Self::minimal) with plain `http` allowed and a smaller
    /// pool, for tests against `httpmock` style servers.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            transport: TransportSecurity::AllowInsecureHttp,
            pool_idle_timeout: Some(Duration::from_secs(10)),
            pool_max_idle_per_host: 4,
            ..Self::minimal()
        }
    }
}
