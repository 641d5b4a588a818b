//! Trait definition for pluggable HTTP transports.
//!
//! The fetcher never talks to the network directly. It hands an
//! [`HttpRequest`] descriptor to a [`Transport`] and classifies the
//! [`FetchOutcome`] it gets back. [`crate::http::ReqwestTransport`] is the
//! production implementation; tests plug in scripted ones.

use crate::proxy::ProxyEndpoint;
use crate::types::FetchOutcome;
use std::collections::BTreeMap;
use url::Url;

/// Everything a transport needs to perform one GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL to fetch.
    pub url: Url,
    /// Headers to send.
    pub headers: BTreeMap<String, String>,
    /// Proxy to route the request through.
    pub proxy: Option<ProxyEndpoint>,
    /// Whether cookies set by earlier responses are replayed.
    pub cookie_jar: bool,
}

/// An HTTP transport executing one request per call.
///
/// Implementations never fail outright: every problem is reported inside
/// the returned [`FetchOutcome`]. Timeouts are the transport's own concern.
///
/// All implementations must be `Send + Sync` so searches can run on any
/// task.
pub trait Transport: Send + Sync {
    /// Execute `request` and report what happened.
    fn execute(
        &self,
        request: &HttpRequest,
    ) -> impl std::future::Future<Output = FetchOutcome> + Send;
}
