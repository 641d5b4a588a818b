//! Result page parsing: organic links, next-page locator and result count.
//!
//! Parsing is pure. Markup that matches nothing yields an empty link list
//! or a zero count, never an error; only a broken built-in selector can
//! fail.

use crate::error::SearchError;
use crate::types::{PageExtraction, ResultLink};
use scraper::{Html, Selector};
use url::Url;

/// Anchors inside organic result titles.
const RESULT_LINK_SELECTOR: &str = ".g h3 a";

/// The "next page" anchor.
const NEXT_PAGE_SELECTOR: &str = "#pnnext";

/// The result statistics element, old and current markup.
const RESULT_STATS_SELECTOR: &str = "#resultStats, #result-stats";

/// Path of the engine's click-through redirect wrapper.
const REDIRECT_PATH: &str = "/url";

/// Base used to resolve relative hrefs before inspecting their path.
const HREF_BASE: &str = "https://www.google.com/";

/// Characters that may separate digit groups inside a count.
const DIGIT_GROUP_SEPARATORS: &[char] = &[',', '.', '\'', ' ', '\u{a0}', '\u{202f}'];

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("invalid selector {css:?}: {e:?}")))
}

/// Extract result links and the next-page locator from a results page.
///
/// For each result title anchor:
/// - a `/url?q=<destination>` redirect yields the destination with an empty
///   title (the wrapper markup carries no clean title); redirects without a
///   `q` parameter are skipped
/// - any other href is used as is, titled with the anchor's text
///
/// # Errors
///
/// Returns [`SearchError::Parse`] only if a built-in selector is invalid.
pub fn extract_links(html: &str) -> Result<PageExtraction, SearchError> {
    let document = Html::parse_document(html);
    let link_sel = selector(RESULT_LINK_SELECTOR)?;
    let next_sel = selector(NEXT_PAGE_SELECTOR)?;

    let mut links = Vec::new();

    for anchor in document.select(&link_sel) {
        let href = match anchor.value().attr("href") {
            Some(h) if !h.is_empty() => h,
            _ => continue,
        };

        match redirect_destination(href) {
            Some(Some(destination)) => links.push(ResultLink::untitled(destination)),
            Some(None) => {
                tracing::debug!(href, "redirect link without destination skipped");
            }
            None => {
                let title = anchor.text().collect::<String>().trim().to_string();
                links.push(ResultLink::new(href, title));
            }
        }
    }

    let next_page = document
        .select(&next_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .filter(|h| !h.is_empty())
        .map(str::to_string);

    tracing::debug!(count = links.len(), has_next = next_page.is_some(), "result page parsed");
    Ok(PageExtraction { links, next_page })
}

/// Inspect `href` for the engine's redirect wrapper.
///
/// Only a root-relative `/url?...` or an absolute URL whose path is `/url`
/// counts; document-relative (`url?q=`) and scheme-relative (`//host/url`)
/// hrefs are ordinary links.
///
/// Returns `None` for ordinary links, `Some(Some(destination))` for a
/// redirect carrying a `q` parameter and `Some(None)` for one without.
fn redirect_destination(href: &str) -> Option<Option<String>> {
    let parsed = if href.starts_with('/') && !href.starts_with("//") {
        Url::parse(HREF_BASE).ok()?.join(href).ok()?
    } else {
        Url::parse(href).ok()?
    };
    if parsed.path() != REDIRECT_PATH {
        return None;
    }
    Some(
        parsed
            .query_pairs()
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty()),
    )
}

/// Parse the engine-reported total result count from a results page.
///
/// Reads the result statistics text and returns its first digit group
/// with separators removed, so `"About 1,234,567 results (0.42 seconds)"`
/// gives `1234567` and `"Environ 1 234 résultats"` gives `1234`. Returns 0
/// when the element is missing or holds no digits.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] only if a built-in selector is invalid.
pub fn parse_result_count(html: &str) -> Result<u64, SearchError> {
    let document = Html::parse_document(html);
    let stats_sel = selector(RESULT_STATS_SELECTOR)?;

    let text = document
        .select(&stats_sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();

    Ok(count_from_stats_text(&text))
}

/// First digit group in `text`, with group separators dropped.
fn count_from_stats_text(text: &str) -> u64 {
    let mut digits = String::new();
    let mut chars = text.chars().skip_while(|c| !c.is_ascii_digit()).peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if DIGIT_GROUP_SEPARATORS.contains(&c)
            && chars.peek().is_some_and(char::is_ascii_digit)
        {
            continue;
        } else {
            break;
        }
    }

    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_SERP_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<div id="search">
  <div class="g">
    <h3 class="r"><a href="/url?q=https://www.rust-lang.org/&amp;sa=U&amp;ved=abc">Rust Programming Language</a></h3>
  </div>
  <div class="g">
    <h3 class="r"><a href="https://doc.rust-lang.org/book/">  The Rust Programming Language Book </a></h3>
  </div>
  <div class="g">
    <h3 class="r"><a href="https://en.wikipedia.org/wiki/Rust_(programming_language)">Rust (programming language) - Wikipedia</a></h3>
  </div>
  <div class="g">
    <h3 class="r"><a href="/url?sa=U&amp;ved=def">Broken redirect</a></h3>
  </div>
</div>
<table id="nav"><tr><td><a id="pnnext" href="/search?q=rust&amp;start=10">Next</a></td></tr></table>
</body>
</html>"#;

    #[test]
    fn extracts_links_in_page_order() {
        let page = extract_links(MOCK_SERP_HTML).expect("should parse");
        assert_eq!(page.links.len(), 3);
        assert_eq!(page.links[0].url, "https://www.rust-lang.org/");
        assert_eq!(page.links[1].url, "https://doc.rust-lang.org/book/");
        assert!(page.links[2].url.contains("wikipedia.org"));
    }

    #[test]
    fn redirect_links_have_empty_title() {
        let page = extract_links(MOCK_SERP_HTML).expect("should parse");
        assert_eq!(page.links[0].title, "");
    }

    #[test]
    fn direct_links_use_anchor_text() {
        let page = extract_links(MOCK_SERP_HTML).expect("should parse");
        assert_eq!(page.links[1].title, "The Rust Programming Language Book");
        assert_eq!(page.links[2].title, "Rust (programming language) - Wikipedia");
    }

    #[test]
    fn next_page_locator_found() {
        let page = extract_links(MOCK_SERP_HTML).expect("should parse");
        assert_eq!(page.next_page.as_deref(), Some("/search?q=rust&start=10"));
    }

    #[test]
    fn extraction_is_idempotent() {
        let first = extract_links(MOCK_SERP_HTML).expect("should parse");
        let second = extract_links(MOCK_SERP_HTML).expect("should parse");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_html_yields_nothing() {
        let page = extract_links("<html><body></body></html>").expect("should parse");
        assert!(page.links.is_empty());
        assert!(page.next_page.is_none());
    }

    #[test]
    fn malformed_markup_tolerated() {
        let page = extract_links("<div class=\"g\"><h3><a href=\"https://a.com\">A")
            .expect("should parse");
        assert_eq!(page.links, vec![ResultLink::new("https://a.com", "A")]);
    }

    #[test]
    fn anchors_outside_results_ignored() {
        let html = r#"<div><h3><a href="https://ad.example">Ad</a></h3></div>
<div class="g"><a href="https://not-a-title.example">Plain</a></div>"#;
        let page = extract_links(html).expect("should parse");
        assert!(page.links.is_empty());
    }

    #[test]
    fn redirect_destination_cases() {
        assert_eq!(
            redirect_destination("/url?q=https://example.com/a%3Fb%3D1&sa=U"),
            Some(Some("https://example.com/a?b=1".to_string()))
        );
        assert_eq!(redirect_destination("/url?sa=U"), Some(None));
        assert_eq!(redirect_destination("https://example.com/page"), None);
        assert_eq!(redirect_destination("/search?q=rust"), None);
    }

    #[test]
    fn only_rooted_or_absolute_redirects_unwrapped() {
        assert_eq!(
            redirect_destination("https://www.google.com/url?q=https://a.example/"),
            Some(Some("https://a.example/".to_string()))
        );
        assert_eq!(redirect_destination("url?q=https://a.example/"), None);
        assert_eq!(redirect_destination("//host.example/url?q=https://a.example/"), None);
        assert_eq!(redirect_destination("/url/?q=https://a.example/"), None);
    }

    #[test]
    fn relative_url_href_kept_as_titled_link() {
        let html = r#"<div class="g"><h3><a href="url?q=https://a.example/">Rel</a></h3></div>"#;
        let page = extract_links(html).expect("should parse");
        assert_eq!(page.links, vec![ResultLink::new("url?q=https://a.example/", "Rel")]);
    }

    #[test]
    fn count_about_results() {
        let html = r#"<div id="resultStats">About 1,234,567 results<nobr> (0.52 seconds)&nbsp;</nobr></div>"#;
        assert_eq!(parse_result_count(html).expect("should parse"), 1_234_567);
    }

    #[test]
    fn count_single_token() {
        let html = r#"<div id="resultStats">1,234</div>"#;
        assert_eq!(parse_result_count(html).expect("should parse"), 1234);
    }

    #[test]
    fn count_leading_number() {
        let html = r#"<div id="result-stats">42 results</div>"#;
        assert_eq!(parse_result_count(html).expect("should parse"), 42);
    }

    #[test]
    fn count_missing_stats_is_zero() {
        assert_eq!(
            parse_result_count("<html><body></body></html>").expect("should parse"),
            0
        );
    }

    #[test]
    fn count_without_digits_is_zero() {
        let html = r#"<div id="resultStats">No results</div>"#;
        assert_eq!(parse_result_count(html).expect("should parse"), 0);
    }

    #[test]
    fn count_from_localised_text() {
        assert_eq!(count_from_stats_text("Environ 1\u{a0}234\u{a0}567 résultats"), 1_234_567);
        assert_eq!(count_from_stats_text("Ungefähr 12.300 Ergebnisse"), 12_300);
        assert_eq!(count_from_stats_text("About 7 results"), 7);
        assert_eq!(count_from_stats_text(""), 0);
    }

    #[test]
    fn count_stops_at_first_group() {
        assert_eq!(count_from_stats_text("About 1,000 results (0.31 seconds)"), 1000);
        assert_eq!(count_from_stats_text("About 1,000, sorted"), 1000);
    }

    // ── Fixture-based parser tests ──────────────────────────────────────

    const FIXTURE_SERP_HTML: &str = include_str!("../test-data/google.html");

    #[test]
    fn fixture_extracts_all_organic_results() {
        let page = extract_links(FIXTURE_SERP_HTML).expect("fixture should parse");
        assert_eq!(page.links.len(), 10);
        for (i, link) in page.links.iter().enumerate() {
            assert!(!link.url.is_empty(), "link {i} has empty URL");
            assert!(
                !link.url.starts_with("/url"),
                "link {i} still wrapped: {}",
                link.url
            );
        }
    }

    #[test]
    fn fixture_titles_follow_link_kind() {
        let page = extract_links(FIXTURE_SERP_HTML).expect("fixture should parse");
        assert_eq!(page.links[0].url, "https://www.rust-lang.org/");
        assert!(page.links[0].title.is_empty());
        assert_eq!(page.links[1].url, "https://doc.rust-lang.org/book/");
        assert_eq!(page.links[1].title, "The Rust Programming Language - The Rust Book");
    }

    #[test]
    fn fixture_has_next_page() {
        let page = extract_links(FIXTURE_SERP_HTML).expect("fixture should parse");
        assert_eq!(
            page.next_page.as_deref(),
            Some("/search?q=rust+programming&start=10")
        );
    }

    #[test]
    fn fixture_result_count() {
        assert_eq!(
            parse_result_count(FIXTURE_SERP_HTML).expect("fixture should parse"),
            284_000_000
        );
    }
}
