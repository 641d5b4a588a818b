//! # serp-search
//!
//! Keyword searches against a web search engine's result pages.
//!
//! A search follows the engine's pagination until it has collected the
//! requested number of result links, or reads the engine-reported total
//! result count in count-only mode.
//!
//! ## Design
//!
//! - [`SearchOptions`] are validated and defaulted into a read-only
//!   [`config::SearchRequest`]; later pages are derived as new values
//! - Each page fetch retries up to the configured limit, switching proxy
//!   after every failed attempt when a [`ProxySource`] is configured
//! - Result links and the next-page locator are parsed with CSS selectors
//! - Pagination is sequential and returns partial results when a later
//!   page fails, so a flaky engine never costs earlier pages
//! - The HTTP layer sits behind the [`Transport`] trait; [`ReqwestTransport`]
//!   is the default and keeps a session cookie jar per search
//!
//! ## Logging
//!
//! All records go through `tracing` with `url` and `proxy` fields. Keywords
//! are logged only at trace level.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod http;
pub mod paginate;
pub mod proxy;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{SearchOptions, SearchRequest};
pub use error::{Result, SearchError};
pub use http::ReqwestTransport;
pub use proxy::{PickStrategy, ProxyEndpoint, ProxyList, ProxySource};
pub use transport::{HttpRequest, Transport};
pub use types::{FetchOutcome, PageExtraction, ResultLink, SearchOutput};

/// Run a search with a fresh [`ReqwestTransport`].
///
/// Returns [`SearchOutput::Count`] when `options.count_only` is set and
/// [`SearchOutput::Links`] otherwise.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the options are invalid (before any
/// network activity) or a proxy source hands out an unusable proxy, or
/// [`SearchError::Fetch`] if a count-only search cannot fetch its page.
/// Link searches that fail part way return the links collected so far
/// instead.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> serp_search::Result<()> {
/// let options = serp_search::SearchOptions::new("rust programming").with_num_results(20);
/// if let serp_search::SearchOutput::Links(links) = serp_search::search(options).await? {
///     for link in &links {
///         println!("{} {}", link.url, link.title);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(options: SearchOptions) -> Result<SearchOutput> {
    search_with(&ReqwestTransport::new(), options).await
}

/// Run a search through a caller-supplied transport.
///
/// # Errors
///
/// Same as [`search`].
pub async fn search_with<T: Transport>(
    transport: &T,
    options: SearchOptions,
) -> Result<SearchOutput> {
    let request = options.normalize()?;
    if request.count_only() {
        paginate::fetch_result_count(transport, &request)
            .await
            .map(SearchOutput::Count)
    } else {
        paginate::collect_links(transport, &request)
            .await
            .map(SearchOutput::Links)
    }
}

/// Collect result links, ignoring `options.count_only`.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the options are invalid.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> serp_search::Result<()> {
/// let links = serp_search::search_links(serp_search::SearchOptions::new("weather today")).await?;
/// println!("{} links", links.len());
/// # Ok(())
/// # }
/// ```
pub async fn search_links(options: SearchOptions) -> Result<Vec<ResultLink>> {
    let request = options.normalize()?;
    paginate::collect_links(&ReqwestTransport::new(), &request).await
}

/// Read the engine-reported total result count, ignoring `options.count_only`.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the options are invalid, or
/// [`SearchError::Fetch`] if the page cannot be fetched.
pub async fn result_count(options: SearchOptions) -> Result<u64> {
    let request = options.normalize()?;
    paginate::fetch_result_count(&ReqwestTransport::new(), &request).await
}
