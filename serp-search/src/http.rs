//! reqwest-backed HTTP transport with a session cookie jar.
//!
//! Provides [`ReqwestTransport`], which builds a [`reqwest::Client`] per
//! attempt so each attempt can go through a different proxy, while all
//! attempts of one transport share a single cookie jar.

use crate::error::SearchError;
use crate::proxy::ProxyEndpoint;
use crate::transport::{HttpRequest, Transport};
use crate::types::FetchOutcome;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use std::sync::Arc;
use std::time::Duration;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Redirects followed before a request is considered failed.
const MAX_REDIRECTS: usize = 10;

/// `Accept` sent when the request carries none of its own.
const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml";

/// Production [`Transport`] on top of reqwest.
///
/// Create one per search so the cookie jar acts as that search's session
/// (consent cookies set on page one are replayed on later pages).
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    jar: Arc<Jar>,
    timeout: Duration,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// A transport with an empty cookie jar and the default timeout.
    pub fn new() -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a [`reqwest::Client`] for one attempt.
    ///
    /// The client has:
    /// - The shared cookie jar, if the request asks for it
    /// - The request's proxy, if any
    /// - The transport timeout and a bounded redirect policy
    /// - Brotli and gzip decompression
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the proxy URL is invalid or the
    /// client cannot be constructed. The proxy is named without its
    /// credentials.
    pub fn build_client(
        &self,
        cookie_jar: bool,
        proxy: Option<&ProxyEndpoint>,
    ) -> Result<reqwest::Client, SearchError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

        if cookie_jar {
            builder = builder.cookie_provider(Arc::clone(&self.jar));
        }

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy.url())
                .map_err(|e| SearchError::Http(format!("invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
    }
}

/// Turn the request headers into a [`HeaderMap`], adding [`DEFAULT_ACCEPT`]
/// unless the request already has an `Accept` header.
///
/// # Errors
///
/// Returns [`SearchError::Http`] naming the first header reqwest rejects.
pub fn header_map(request: &HttpRequest) -> Result<HeaderMap, SearchError> {
    let mut map = HeaderMap::with_capacity(request.headers.len() + 1);
    for (name, value) in &request.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SearchError::Http(format!("invalid header name {name:?}: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| SearchError::Http(format!("invalid value for header {name:?}: {e}")))?;
        map.insert(header_name, header_value);
    }
    if !map.contains_key(ACCEPT) {
        map.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    }
    Ok(map)
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> FetchOutcome {
        let client = match self.build_client(request.cookie_jar, request.proxy.as_ref()) {
            Ok(client) => client,
            Err(err) => return FetchOutcome::failed(err.to_string()),
        };
        let headers = match header_map(request) {
            Ok(headers) => headers,
            Err(err) => return FetchOutcome::failed(err.to_string()),
        };

        let response = match client.get(request.url.clone()).headers(headers).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::failed(format!("request failed: {e}")),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => {
                tracing::trace!(status, bytes = body.len(), "response received");
                FetchOutcome::response(status, body)
            }
            Err(e) => FetchOutcome {
                error: Some(format!("response read failed: {e}")),
                status: Some(status),
                body: None,
            },
        }
    }
}
