//! Search options and their normalisation into a ready-to-run request.
//!
//! [`SearchOptions`] is what callers fill in; every field is optional so it
//! can be deserialised from a partial document. [`SearchOptions::normalize`]
//! validates it and fills in defaults, producing a [`SearchRequest`] that is
//! read-only from then on. Later pages are derived with
//! [`SearchRequest::next_page`], which returns a new value.

use crate::error::SearchError;
use crate::proxy::{ProxyEndpoint, ProxySource};
use crate::transport::HttpRequest;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// User-Agent sent when the caller supplies none.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:40.0) Gecko/20100101 Firefox/40.1";

/// Host searched when the caller supplies none.
pub const DEFAULT_HOST: &str = "google.com";

/// Number of links collected when the caller supplies no count.
pub const DEFAULT_NUM_RESULTS: usize = 10;

/// Attempts per page fetch when the caller supplies no limit.
pub const DEFAULT_RETRY_LIMIT: u32 = 5;

/// Upper bound on pages fetched by one link search.
pub const DEFAULT_MAX_PAGES: usize = 50;

/// Path of the engine's search endpoint.
const SEARCH_PATH: &str = "/search";

/// Query parameter holding the keyword.
const KEYWORD_PARAM: &str = "q";

/// Caller-facing search options.
///
/// Use [`SearchOptions::new`] with the `with_*` methods, or deserialise from
/// any serde format:
///
/// ```
/// let options: serp_search::SearchOptions = serde_json::from_str(
///     r#"{ "host": "google.be", "num_results": 20, "query": { "q": "rust", "hl": "fr" } }"#,
/// ).unwrap();
/// let request = options.normalize().unwrap();
/// assert_eq!(request.url().as_str(), "https://www.google.be/search?hl=fr&q=rust");
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Engine host, e.g. `google.fr`. Defaults to [`DEFAULT_HOST`].
    pub host: Option<String>,
    /// Full origin overriding `https://www.{host}`, e.g. a local test server.
    pub origin: Option<String>,
    /// How many links to collect. Defaults to [`DEFAULT_NUM_RESULTS`].
    pub num_results: Option<usize>,
    /// Query parameters sent to the engine. Must contain a non-empty `q`.
    pub query: Option<BTreeMap<String, String>>,
    /// Extra request headers.
    pub headers: Option<BTreeMap<String, String>>,
    /// Attempts per page fetch. Defaults to [`DEFAULT_RETRY_LIMIT`].
    pub retry_limit: Option<u32>,
    /// Delay in milliseconds before each request and between retries.
    pub delay_ms: Option<u64>,
    /// Fixed initial proxy URL, used when no proxy source is configured.
    pub proxy: Option<String>,
    /// Where to pick proxies from. Takes precedence over `proxy`.
    #[serde(skip)]
    pub proxy_source: Option<Arc<dyn ProxySource>>,
    /// Return only the engine-reported result count.
    pub count_only: bool,
    /// Page cap for link searches. Defaults to [`DEFAULT_MAX_PAGES`].
    pub max_pages: Option<usize>,
}

impl SearchOptions {
    /// Options searching for `keyword` with every other field defaulted.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self::default().with_query_param(KEYWORD_PARAM, keyword)
    }

    /// Set the engine host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Override the origin requests are sent to.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Set how many links to collect.
    pub fn with_num_results(mut self, num: usize) -> Self {
        self.num_results = Some(num);
        self
    }

    /// Add a query parameter.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Set the number of attempts per page fetch.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = Some(retry_limit);
        self
    }

    /// Set the delay before each request and between retries.
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = Some(ms);
        self
    }

    /// Use a fixed initial proxy.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Pick proxies from `source`, rotating on every failed attempt.
    pub fn with_proxy_source(mut self, source: Arc<dyn ProxySource>) -> Self {
        self.proxy_source = Some(source);
        self
    }

    /// Switch to count-only mode.
    pub fn with_count_only(mut self, count_only: bool) -> Self {
        self.count_only = count_only;
        self
    }

    /// Set the page cap for link searches.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Validate these options and fill in defaults.
    ///
    /// Checks:
    /// - `query` must be present and hold a non-blank `q`
    /// - `num_results` and `max_pages` must be greater than 0
    /// - the origin (or `https://www.{host}`) must be a valid URL
    /// - every header name and value must be valid HTTP
    /// - the initial proxy, fixed or picked, must be a usable proxy URL
    ///
    /// A missing User-Agent header is filled with [`DEFAULT_USER_AGENT`]; one
    /// supplied under any capitalisation is kept as is. When a proxy source
    /// is configured the initial proxy is picked from it right away. No
    /// network I/O happens here.
    pub fn normalize(self) -> Result<SearchRequest, SearchError> {
        let query = self.query.ok_or_else(|| {
            SearchError::Config("no query parameters in the search options".into())
        })?;
        match query.get(KEYWORD_PARAM) {
            Some(keyword) if !keyword.trim().is_empty() => {}
            _ => {
                return Err(SearchError::Config(
                    "the search options do not contain a keyword".into(),
                ))
            }
        }

        let num_results = self.num_results.unwrap_or(DEFAULT_NUM_RESULTS);
        if num_results == 0 {
            return Err(SearchError::Config(
                "num_results must be greater than 0".into(),
            ));
        }
        let max_pages = self.max_pages.unwrap_or(DEFAULT_MAX_PAGES);
        if max_pages == 0 {
            return Err(SearchError::Config(
                "max_pages must be greater than 0".into(),
            ));
        }

        let host = self.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let origin_str = self
            .origin
            .unwrap_or_else(|| format!("https://www.{host}"));
        let origin = Url::parse(&origin_str).map_err(|e| {
            SearchError::Config(format!("invalid search origin {origin_str:?}: {e}"))
        })?;
        if origin.cannot_be_a_base() {
            return Err(SearchError::Config(format!(
                "invalid search origin {origin_str:?}: not a base URL"
            )));
        }
        let mut url = origin
            .join(SEARCH_PATH)
            .map_err(|e| SearchError::Config(format!("invalid search URL: {e}")))?;
        url.query_pairs_mut().extend_pairs(query.iter());

        let mut headers = self.headers.unwrap_or_default();
        for (name, value) in &headers {
            validate_header(name, value)?;
        }
        let has_user_agent = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("user-agent"));
        if !has_user_agent {
            headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
        }

        let proxy = match self.proxy_source {
            Some(ref source) => Some(source.next()),
            None => self.proxy.map(ProxyEndpoint::new),
        };
        if let Some(ref proxy) = proxy {
            proxy.validate()?;
        }

        Ok(SearchRequest {
            host,
            origin,
            url,
            num_results,
            query,
            headers,
            retry_limit: self.retry_limit.unwrap_or(DEFAULT_RETRY_LIMIT),
            delay_ms: self.delay_ms,
            proxy_source: self.proxy_source,
            proxy,
            cookie_jar: true,
            count_only: self.count_only,
            max_pages,
            page: 1,
        })
    }
}

/// A validated, fully defaulted search request for one page.
///
/// Read-only: later pages are separate values built with
/// [`SearchRequest::next_page`].
#[derive(Clone)]
pub struct SearchRequest {
    host: String,
    origin: Url,
    url: Url,
    num_results: usize,
    query: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    retry_limit: u32,
    delay_ms: Option<u64>,
    proxy_source: Option<Arc<dyn ProxySource>>,
    proxy: Option<ProxyEndpoint>,
    cookie_jar: bool,
    count_only: bool,
    max_pages: usize,
    page: usize,
}

impl SearchRequest {
    /// Engine host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Origin that relative page locators are resolved against.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// URL fetched for this page.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// How many links the search collects at most.
    pub fn num_results(&self) -> usize {
        self.num_results
    }

    /// The search keyword.
    pub fn keyword(&self) -> &str {
        self.query
            .get(KEYWORD_PARAM)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Query parameters of the first page.
    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Request headers, always including a User-Agent.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Attempts per page fetch. Zero behaves like one.
    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Delay before each request and between retries.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }

    /// Configured proxy source.
    pub fn proxy_source(&self) -> Option<&Arc<dyn ProxySource>> {
        self.proxy_source.as_ref()
    }

    /// Proxy used for the first attempt on this page.
    pub fn proxy(&self) -> Option<&ProxyEndpoint> {
        self.proxy.as_ref()
    }

    /// Whether the session cookie jar is used. Always `true` after normalisation.
    pub fn cookie_jar(&self) -> bool {
        self.cookie_jar
    }

    /// Whether this is a count-only search.
    pub fn count_only(&self) -> bool {
        self.count_only
    }

    /// Page cap for link searches.
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// 1-based number of the page this request fetches.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Derive the request for the page behind `locator`.
    ///
    /// The locator is resolved against the origin and must stay on it.
    /// Everything else is carried over, with `proxy` (the one the previous
    /// page ended on) as the starting proxy.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the locator does not resolve or
    /// points at another scheme, host or port.
    pub fn next_page(
        &self,
        locator: &str,
        proxy: Option<ProxyEndpoint>,
    ) -> Result<SearchRequest, SearchError> {
        let url = self.origin.join(locator).map_err(|e| {
            SearchError::Config(format!("invalid next page locator {locator:?}: {e}"))
        })?;
        if url.origin() != self.origin.origin() {
            return Err(SearchError::Config(format!(
                "next page locator {locator:?} leaves the search origin"
            )));
        }
        Ok(SearchRequest {
            url,
            proxy,
            page: self.page + 1,
            ..self.clone()
        })
    }

    /// Descriptor for one HTTP attempt through `proxy`.
    pub fn http_request(&self, proxy: Option<&ProxyEndpoint>) -> HttpRequest {
        HttpRequest {
            url: self.url.clone(),
            headers: self.headers.clone(),
            proxy: proxy.cloned(),
            cookie_jar: self.cookie_jar,
        }
    }
}

impl fmt::Debug for SearchRequest {
    // The keyword is left out so it only shows up in trace-level records.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchRequest")
            .field("host", &self.host)
            .field("page", &self.page)
            .field("num_results", &self.num_results)
            .field("retry_limit", &self.retry_limit)
            .field("delay_ms", &self.delay_ms)
            .field("proxy", &self.proxy)
            .field("has_proxy_source", &self.proxy_source.is_some())
            .field("cookie_jar", &self.cookie_jar)
            .field("count_only", &self.count_only)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

/// Reject a header reqwest could not send. The value is left out of the
/// message since it may be a credential.
fn validate_header(name: &str, value: &str) -> Result<(), SearchError> {
    reqwest::header::HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| SearchError::Config(format!("invalid header name {name:?}")))?;
    reqwest::header::HeaderValue::from_str(value)
        .map_err(|_| SearchError::Config(format!("invalid value for header {name:?}")))?;
    Ok(())
}
