//! HTTP page fetching and visible-text extraction.
//!
//! One GET per URL with a browser-like User-Agent, then the parsed HTML
//! is reduced to its visible text (script/style/markup stripped). Any
//! network failure or non-success status surfaces as a fetch error for
//! the pipeline to log and skip.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Node};
use tracing::debug;
use url::Url;

use sheetsum_core::PageFetcher;
use sheetsum_shared::{Result, SheetsumError};

/// Browser-like User-Agent; some sites refuse unadorned clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// HTTP-backed [`PageFetcher`] implementation.
pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    /// Build a fetcher with a shared HTTP client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SheetsumError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for ContentFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let parsed =
            Url::parse(url).map_err(|e| SheetsumError::Fetch(format!("{url}: invalid URL: {e}")))?;

        debug!(%parsed, "fetching page");

        let response = self
            .client
            .get(parsed.as_str())
            .send()
            .await
            .map_err(|e| SheetsumError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetsumError::Fetch(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SheetsumError::Fetch(format!("{url}: body read failed: {e}")))?;

        Ok(extract_visible_text(&body))
    }
}

/// Non-visible containers whose text must not leak into the extraction.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "head", "template"];

/// Reduce an HTML document to its visible text.
///
/// Text nodes under hidden containers are dropped; the rest are trimmed
/// and joined with newlines, in document order.
pub fn extract_visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    let mut parts: Vec<&str> = Vec::new();
    for node in doc.root_element().descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
            });
            if hidden {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }

    parts.join("\n")
}
