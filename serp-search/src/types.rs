//! Core types for result links, page extractions and fetch outcomes.

use serde::{Deserialize, Serialize};

/// A single organic result link found on a results page.
///
/// Lists of links keep the engine's ranking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLink {
    /// Destination URL of the result.
    pub url: String,
    /// Human-readable title. Empty when the markup only exposes a redirect
    /// wrapper around the destination.
    pub title: String,
}

impl ResultLink {
    /// Create a link with a title.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    /// Create a link whose title could not be recovered.
    pub fn untitled(url: impl Into<String>) -> Self {
        Self::new(url, String::new())
    }
}

/// Everything extracted from one results page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    /// Result links in page order.
    pub links: Vec<ResultLink>,
    /// Href of the "next page" anchor, if the page has one.
    pub next_page: Option<String>,
}

/// Raw result of a single HTTP attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Transport-level error, if the request did not complete.
    pub error: Option<String>,
    /// HTTP status code, if a response was received.
    pub status: Option<u16>,
    /// Response body, if it could be read.
    pub body: Option<String>,
}

impl FetchOutcome {
    /// An outcome for a request that produced a response.
    pub fn response(status: u16, body: impl Into<String>) -> Self {
        Self {
            error: None,
            status: Some(status),
            body: Some(body.into()),
        }
    }

    /// An outcome for a request that failed before a response was read.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            status: None,
            body: None,
        }
    }

    /// `true` when the transport reported no error and the status is 200.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status == Some(200)
    }

    /// Describes why this outcome counts as a failure, or `None` on success.
    pub fn failure_reason(&self) -> Option<String> {
        if let Some(ref error) = self.error {
            return Some(error.clone());
        }
        match self.status {
            Some(200) => None,
            Some(status) => Some(format!("invalid HTTP status {status}")),
            None => Some("no response received".to_string()),
        }
    }
}

/// What a search returns, depending on its mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchOutput {
    /// Accumulated result links, never more than requested.
    Links(Vec<ResultLink>),
    /// Total result count reported by the engine.
    Count(u64),
}

impl SearchOutput {
    /// Returns the links, or `None` for a count-only search.
    pub fn links(&self) -> Option<&[ResultLink]> {
        match self {
            Self::Links(links) => Some(links),
            Self::Count(_) => None,
        }
    }

    /// Returns the count, or `None` for a link search.
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Links(_) => None,
            Self::Count(count) => Some(*count),
        }
    }
}
