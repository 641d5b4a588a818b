//! Proxy endpoints and pluggable proxy sources.
//!
//! A [`ProxySource`] hands out the next egress proxy on demand. The fetcher
//! asks for a fresh one after every failed attempt, so a failing proxy is
//! never retried back to back.
//!
//! Endpoints render without their user name and password, so credentials
//! never reach log records or error messages.

use crate::error::SearchError;
use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single proxy endpoint, e.g. `http://10.0.0.1:3128`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint {
    url: String,
}

impl ProxyEndpoint {
    /// Wrap a proxy URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// The proxy URL, credentials included.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The proxy URL with any user name and password removed.
    pub fn redacted(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(mut parsed) => {
                if parsed.username().is_empty() && parsed.password().is_none() {
                    return self.url.clone();
                }
                // Both setters only fail for URLs without a host, which
                // cannot carry credentials in the first place.
                let _ = parsed.set_username("");
                let _ = parsed.set_password(None);
                parsed.to_string()
            }
            // Unparseable: drop everything between the scheme and the last '@'.
            Err(_) => match self.url.rsplit_once('@') {
                Some((userinfo, host)) => match userinfo.split_once("://") {
                    Some((scheme, _)) => format!("{scheme}://{host}"),
                    None => host.to_string(),
                },
                None => self.url.clone(),
            },
        }
    }

    /// Check that the URL is usable as an HTTP proxy.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] naming the (redacted) proxy.
    pub fn validate(&self) -> Result<(), SearchError> {
        reqwest::Proxy::all(self.url.as_str())
            .map(|_| ())
            .map_err(|e| SearchError::Config(format!("invalid proxy {self}: {e}")))
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProxyEndpoint").field(&self.redacted()).finish()
    }
}

/// Anything that can pick the next proxy endpoint.
///
/// Implementations are shared between concurrent searches and must be
/// safe to call from several tasks at once.
pub trait ProxySource: fmt::Debug + Send + Sync {
    /// Pick the next proxy to use.
    fn next(&self) -> ProxyEndpoint;
}

/// How [`ProxyList`] picks its next endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickStrategy {
    /// Cycle through the list in order.
    RoundRobin,
    /// Pick uniformly at random.
    Random,
}

/// A [`ProxySource`] over a fixed, non-empty list of endpoints.
#[derive(Debug)]
pub struct ProxyList {
    endpoints: Vec<ProxyEndpoint>,
    strategy: PickStrategy,
    cursor: AtomicUsize,
}

impl ProxyList {
    /// Build a list from proxy URLs. Returns `None` when `urls` is empty.
    pub fn new<I, S>(urls: I, strategy: PickStrategy) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints: Vec<ProxyEndpoint> = urls.into_iter().map(ProxyEndpoint::new).collect();
        if endpoints.is_empty() {
            return None;
        }
        Some(Self {
            endpoints,
            strategy,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Number of endpoints in the list.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always `false`; construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl ProxySource for ProxyList {
    fn next(&self) -> ProxyEndpoint {
        let index = match self.strategy {
            PickStrategy::RoundRobin => {
                self.cursor.fetch_add(1, Ordering::Relaxed) % self.endpoints.len()
            }
            PickStrategy::Random => rand::thread_rng().gen_range(0..self.endpoints.len()),
        };
        self.endpoints[index].clone()
    }
}
