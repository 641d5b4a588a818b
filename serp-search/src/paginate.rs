//! Pagination driver: fetch, extract, decide, repeat.
//!
//! # Link accumulation
//!
//! ```text
//!              ┌──────────────────── next page locator ───────────────────┐
//!              ▼                                                          │
//! ┌──────────┐  200  ┌────────────┐  links > 0  ┌──────────┐  < num   ────┘
//! │ Fetching ├──────►│ Extracting ├────────────►│ Deciding │
//! └────┬─────┘       └─────┬──────┘             └────┬─────┘
//!      │ retries           │ no links                │ ≥ num, no locator,
//!      │ exhausted         ▼                         │ or page cap reached
//!      └─────────────►  ┌──────┐  ◄──────────────────┘
//!                       │ Done │
//!                       └──────┘
//! ```
//!
//! Every path into `Done` returns the links gathered so far; a failing page
//! never discards earlier pages. A locator that leaves the search origin
//! also ends in `Done`. The one exception is an unusable proxy from the
//! proxy source, which aborts the search with a configuration error.
//!
//! Pages are fetched strictly one after the other since each locator is
//! only known once the previous page is parsed.
//!
//! # Count only
//!
//! One fetch (with retries), then the result statistics are parsed. A failed
//! fetch is fatal here.

use crate::config::SearchRequest;
use crate::error::SearchError;
use crate::extract::{extract_links, parse_result_count};
use crate::fetch::fetch_with_retry;
use crate::proxy::ProxyEndpoint;
use crate::transport::Transport;
use crate::types::ResultLink;

/// Collect up to `request.num_results()` links, following next-page
/// locators.
///
/// Stops early, returning the partial list, when a page fetch fails after
/// all retries, a page has no links, there is no usable next-page locator,
/// or `request.max_pages()` pages have been fetched.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the proxy source hands out an
/// unusable proxy, and [`SearchError::Parse`] if a built-in selector is
/// invalid. Fetch failures end pagination without an error.
pub async fn collect_links<T: Transport>(
    transport: &T,
    request: &SearchRequest,
) -> Result<Vec<ResultLink>, SearchError> {
    tracing::trace!(keyword = request.keyword(), "link search");

    let wanted = request.num_results();
    let mut links: Vec<ResultLink> = Vec::new();
    let mut page = request.clone();

    loop {
        let report = fetch_with_retry(transport, &page).await?;
        let body = match report.body() {
            Ok(body) => body,
            Err(err) => {
                let proxy = report.proxy.as_ref().map(ProxyEndpoint::redacted);
                tracing::warn!(
                    url = %page.url(),
                    proxy = proxy.as_deref(),
                    error = %err,
                    collected = links.len(),
                    "page fetch failed, returning partial results"
                );
                return Ok(links);
            }
        };

        let extraction = extract_links(body)?;
        if extraction.links.is_empty() {
            tracing::debug!(url = %page.url(), collected = links.len(), "page has no links");
            return Ok(links);
        }

        links.extend(extraction.links);
        tracing::debug!(
            url = %page.url(),
            page = page.page(),
            collected = links.len(),
            wanted,
            "page collected"
        );

        if links.len() >= wanted {
            links.truncate(wanted);
            return Ok(links);
        }

        let Some(locator) = extraction.next_page else {
            tracing::debug!(collected = links.len(), "no next page");
            return Ok(links);
        };

        if page.page() >= page.max_pages() {
            tracing::warn!(
                max_pages = page.max_pages(),
                collected = links.len(),
                "page cap reached, returning partial results"
            );
            return Ok(links);
        }

        page = match page.next_page(&locator, report.proxy) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(error = %err, collected = links.len(), "unusable next page locator");
                return Ok(links);
            }
        };
    }
}

/// Fetch the first results page and parse the engine-reported total.
///
/// Returns 0 when the page carries no recognisable count.
///
/// # Errors
///
/// Returns [`SearchError::Fetch`] if the page could not be fetched after
/// all retries, or [`SearchError::Config`] if the proxy source hands out an
/// unusable proxy.
pub async fn fetch_result_count<T: Transport>(
    transport: &T,
    request: &SearchRequest,
) -> Result<u64, SearchError> {
    tracing::trace!(keyword = request.keyword(), "result count search");

    let report = fetch_with_retry(transport, request).await?;
    let body = report.body().inspect_err(|err| {
        let proxy = report.proxy.as_ref().map(ProxyEndpoint::redacted);
        tracing::error!(
            url = %request.url(),
            proxy = proxy.as_deref(),
            error = %err,
            "result count fetch failed"
        );
    })?;

    let count = parse_result_count(body)?;
    tracing::debug!(url = %request.url(), count, "result count parsed");
    Ok(count)
}
