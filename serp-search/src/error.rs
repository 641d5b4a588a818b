//! Error types for the serp-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Proxies are named by their redacted URL, so
//! credentials never appear in error messages.

/// Errors that can occur during a search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The search options are missing a required field or hold an invalid value.
    #[error("config error: {0}")]
    Config(String),

    /// A page fetch still failed after every allowed attempt.
    #[error("fetch failed after {attempts} attempt(s): {reason}")]
    Fetch {
        /// Transport error or status description from the last attempt.
        reason: String,
        /// HTTP status of the last attempt, if a response was received.
        status: Option<u16>,
        /// How many attempts were made.
        attempts: u32,
    },

    /// The HTTP transport could not build a client or headers for a request.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A built-in CSS selector failed to compile.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Convenience type alias for serp-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
