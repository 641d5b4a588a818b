//! Shared test utilities used across multiple test modules.
//!
//! Consolidates the scripted transport and proxy source used by the
//! `fetch`, `paginate` and crate-level tests.

use crate::proxy::{ProxyEndpoint, ProxySource};
use crate::transport::{HttpRequest, Transport};
use crate::types::FetchOutcome;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replays scripted outcomes and records every request it sees.
/// Once the script runs out it keeps answering with a 503.
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<FetchOutcome>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<FetchOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// A transport answering each entry of `pages` with a 200, in order.
    pub fn pages(pages: &[String]) -> Self {
        Self::new(
            pages
                .iter()
                .map(|body| FetchOutcome::response(200, body.as_str()))
                .collect(),
        )
    }

    /// Every request executed so far.
    pub fn seen(&self) -> Vec<HttpRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Number of requests executed so far.
    pub fn calls(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or_default()
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: &HttpRequest) -> FetchOutcome {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        self.outcomes
            .lock()
            .ok()
            .and_then(|mut o| o.pop_front())
            .unwrap_or_else(|| FetchOutcome::response(503, "unavailable"))
    }
}

/// Hands out `http://proxy-N:8080` with an increasing N.
#[derive(Debug, Default)]
pub struct CountingProxies {
    picks: AtomicUsize,
}

impl CountingProxies {
    /// How many proxies have been picked so far.
    pub fn picks(&self) -> usize {
        self.picks.load(Ordering::SeqCst)
    }
}

impl ProxySource for CountingProxies {
    fn next(&self) -> ProxyEndpoint {
        let n = self.picks.fetch_add(1, Ordering::SeqCst);
        ProxyEndpoint::new(format!("http://proxy-{n}:8080"))
    }
}

/// A results page with one `.g` entry per `(href, title)` pair and an
/// optional next-page anchor.
pub fn serp_page(links: &[(&str, &str)], next_page: Option<&str>) -> String {
    let mut html = String::from("<html><body><div id=\"search\">");
    for (href, title) in links {
        html.push_str(&format!(
            "<div class=\"g\"><h3 class=\"r\"><a href=\"{href}\">{title}</a></h3></div>"
        ));
    }
    html.push_str("</div>");
    if let Some(next) = next_page {
        html.push_str(&format!("<a id=\"pnnext\" href=\"{next}\">Next</a>"));
    }
    html.push_str("</body></html>");
    html
}

/// A results page with `count` direct links `https://{prefix}{i}.example/`.
pub fn numbered_page(prefix: &str, count: usize, next_page: Option<&str>) -> String {
    let links: Vec<(String, String)> = (0..count)
        .map(|i| {
            (
                format!("https://{prefix}{i}.example/"),
                format!("{prefix} result {i}"),
            )
        })
        .collect();
    let borrowed: Vec<(&str, &str)> = links
        .iter()
        .map(|(href, title)| (href.as_str(), title.as_str()))
        .collect();
    serp_page(&borrowed, next_page)
}
