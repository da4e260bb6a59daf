use std::fmt::Debug;
use std::time::Duration;

/// The base URL used when none is given.
pub const DEFAULT_BASE_URL: &str = "https://127.0.0.1:8000";

/// Builder for [`HttpTransportConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HttpTransportConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    force_https: bool,
}

impl HttpTransportConfigBuilder {
    /// Creates a builder with the given base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Sets a timeout for each request. Without one, requests wait as long
    /// as the underlying client allows.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets whether `http://` base URLs are upgraded to `https://`.
    /// Defaults to `true`.
    #[inline]
    pub fn with_force_https(mut self, force_https: bool) -> Self {
        self.force_https = force_https;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> HttpTransportConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = if self.force_https {
            secure_url(&base_url)
        } else {
            base_url
        };
        HttpTransportConfig {
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout: self.timeout,
        }
    }
}

impl Default for HttpTransportConfigBuilder {
    #[inline]
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: None,
            force_https: true,
        }
    }
}

impl Debug for HttpTransportConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfigBuilder")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("force_https", &self.force_https)
            .finish()
    }
}

/// Configuration for [`HttpTransport`](crate::HttpTransport).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HttpTransportConfig {
    pub(crate) base_url: String,
    pub(crate) timeout: Option<Duration>,
}

impl HttpTransportConfig {
    /// Returns the chat endpoint.
    #[inline]
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, "/api/chat")
    }
}

impl Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn secure_url(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_owned(),
    }
}
