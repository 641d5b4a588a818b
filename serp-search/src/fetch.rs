//! Single page fetch with bounded retries and proxy failover.
//!
//! An attempt fails when the transport reports an error or the status is
//! not 200. After each failure a fresh proxy is taken from the request's
//! proxy source, if it has one. A proxy the source hands out that is not a
//! usable proxy URL is a configuration error and ends the fetch at once.
//! Page content is never inspected here.

use crate::config::SearchRequest;
use crate::error::SearchError;
use crate::proxy::ProxyEndpoint;
use crate::transport::Transport;
use crate::types::FetchOutcome;

/// What a retried fetch ended with.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// Outcome of the last attempt.
    pub outcome: FetchOutcome,
    /// Attempts made, including the last one.
    pub attempts: u32,
    /// Proxy the fetch ended on, carried forward to the next page.
    pub proxy: Option<ProxyEndpoint>,
}

impl FetchReport {
    /// `true` when the last attempt succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// The failure of the last attempt as a [`SearchError::Fetch`], if any.
    pub fn error(&self) -> Option<SearchError> {
        self.outcome
            .failure_reason()
            .map(|reason| SearchError::Fetch {
                reason,
                status: self.outcome.status,
                attempts: self.attempts,
            })
    }

    /// The page body of a successful fetch.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Fetch`] describing the last attempt if every
    /// attempt failed.
    pub fn body(&self) -> Result<&str, SearchError> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(self.outcome.body.as_deref().unwrap_or_default()),
        }
    }
}

/// Fetch the page described by `request`, retrying on failure.
///
/// Waits the request's delay before the first attempt and between
/// attempts, and makes at most `retry_limit` attempts (at least one).
/// Every attempt and every failure is logged with the URL and the
/// redacted proxy.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the proxy source hands out a proxy
/// URL that cannot be used. Failed attempts are not errors; they are
/// reported through the returned [`FetchReport`].
pub async fn fetch_with_retry<T: Transport>(
    transport: &T,
    request: &SearchRequest,
) -> Result<FetchReport, SearchError> {
    let delay = request.delay();
    let max_attempts = request.retry_limit().max(1);
    let mut proxy = request.proxy().cloned();

    if let Some(delay) = delay {
        tracing::info!(
            url = %request.url(),
            delay_ms = delay.as_millis() as u64,
            "waiting before search request"
        );
        tokio::time::sleep(delay).await;
    }

    let mut outcome = FetchOutcome::default();
    for attempt in 1..=max_attempts {
        let proxy_label = proxy.as_ref().map(ProxyEndpoint::redacted);
        tracing::info!(
            url = %request.url(),
            proxy = proxy_label.as_deref(),
            attempt,
            max_attempts,
            options = ?request,
            "executing search request"
        );

        outcome = transport.execute(&request.http_request(proxy.as_ref())).await;

        let Some(reason) = outcome.failure_reason() else {
            return Ok(FetchReport {
                outcome,
                attempts: attempt,
                proxy,
            });
        };

        tracing::warn!(
            url = %request.url(),
            proxy = proxy_label.as_deref(),
            attempt,
            error = %reason,
            "search request failed"
        );

        if let Some(source) = request.proxy_source() {
            let next = source.next();
            next.validate().inspect_err(|err| {
                tracing::error!(
                    url = %request.url(),
                    error = %err,
                    "proxy source gave an unusable proxy"
                );
            })?;
            proxy = Some(next);
        }

        if attempt < max_attempts {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }
    }

    Ok(FetchReport {
        outcome,
        attempts: max_attempts,
        proxy,
    })
}
