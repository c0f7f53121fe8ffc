//! Web search for agents carrying [`crate::agent::AgentTool::WebSearch`].
//!
//! The default backend is DuckDuckGo's HTML endpoint: free, no API key, and
//! stable enough markup (`result__a` / `result__snippet`) to scrape with two
//! regexes. The [`SearchTool`] trait is the seam tests use to stub it out.

use crate::error::CrewError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    /// Markdown block used when the result is attached to a stage request.
    pub fn to_markdown(&self) -> String {
        if self.snippet.is_empty() {
            format!("### {}\nURL: {}", self.title, self.url)
        } else {
            format!("### {}\n{}\nURL: {}", self.title, self.snippet, self.url)
        }
    }
}

/// A retrieval backend: `search(query) -> [result]`.
#[async_trait]
pub trait SearchTool: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CrewError>;
}

/// DuckDuckGo HTML search.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(max_results: usize, timeout_secs: u64) -> Result<Self, CrewError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("edgequake-crew/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CrewError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_results: max_results.max(1),
        })
    }
}

#[async_trait]
impl SearchTool for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CrewError> {
        let url = format!("{}?q={}", DUCKDUCKGO_HTML_URL, urlencoding::encode(query));
        debug!("Web search request: {}", url);

        let failed = |reason: String| CrewError::SearchFailed {
            query: query.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let html = response.text().await.map_err(|e| failed(e.to_string()))?;
        let results = parse_duckduckgo_results(&html, self.max_results);
        info!("Web search '{}': {} results", query, results.len());
        Ok(results)
    }
}

static RE_RESULT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).unwrap()
});

static RE_RESULT_SNIPPET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#).unwrap()
});

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Extract up to `limit` results from a DuckDuckGo HTML results page.
fn parse_duckduckgo_results(html: &str, limit: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    // Each hit sits in its own `class="result ..."` block; splitting on the
    // block marker keeps a snippet paired with its own link.
    for block in html.split("class=\"result ").skip(1) {
        let Some(link) = RE_RESULT_LINK.captures(block) else {
            continue;
        };
        let title = clean_fragment(&link[2]);
        if title.is_empty() {
            continue;
        }
        let snippet = RE_RESULT_SNIPPET
            .captures(block)
            .map(|c| clean_fragment(&c[1]))
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            url: resolve_redirect(&link[1]),
            snippet,
        });
        if results.len() == limit {
            break;
        }
    }

    results
}

/// Strip tags, decode entities, collapse whitespace.
fn clean_fragment(fragment: &str) -> String {
    let no_tags = RE_TAGS.replace_all(fragment, "");
    let decoded = html_escape::decode_html_entities(&no_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// DuckDuckGo wraps targets as `//duckduckgo.com/l/?uddg=<encoded>&…`.
fn resolve_redirect(href: &str) -> String {
    let href = html_escape::decode_html_entities(href);
    if let Some(pos) = href.find("uddg=") {
        let encoded = href[pos + 5..].split('&').next().unwrap_or_default();
        if let Ok(target) = urlencoding::decode(encoded) {
            return target.into_owned();
        }
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{rest}");
    }
    href.into_owned()
}

/// Render results as the "Web search results" section of a request.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }
    results
        .iter()
        .map(SearchResult::to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}
