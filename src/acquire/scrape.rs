//! CSS-selector scraping for sites without a usable feed.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::AcquiredItem;
use crate::http::{self, resolve_url, FetchFailure};
use crate::{BlogwatchError, Result};

/// Extracts item links from an HTML page with a CSS selector.
#[derive(Debug, Clone)]
pub struct ScrapeAcquirer {
    client: Client,
    timeout: Duration,
    max_bytes: u64,
}

impl ScrapeAcquirer {
    pub fn new(client: Client, timeout: Duration, max_bytes: u64) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    /// Fetch `page_url` and collect one item per element matching `selector`.
    pub async fn scrape(&self, page_url: &str, selector: &str) -> Result<Vec<AcquiredItem>> {
        let page = http::fetch(&self.client, page_url, self.timeout, self.max_bytes)
            .await
            .map_err(|e| match e {
                FetchFailure::InvalidUrl(_) => BlogwatchError::ScrapeParse(e.to_string()),
                _ => BlogwatchError::ScrapeFetch(e.to_string()),
            })?;

        let items = extract_items(&page.text(), &page.url, selector)?;
        debug!("Scraped {} item(s) from {} ({})", items.len(), page_url, selector);
        Ok(items)
    }
}

/// Collect items from `html` for every element matching `selector`.
///
/// A match that is not itself an anchor is narrowed to its first descendant
/// anchor. Hrefs resolve against `base`, and the first occurrence of a URL
/// wins. Titles fall back from link text to the `title` attribute to the
/// matched container's text.
pub fn extract_items(html: &str, base: &Url, selector: &str) -> Result<Vec<AcquiredItem>> {
    let matcher = Selector::parse(selector)
        .map_err(|e| BlogwatchError::ScrapeParse(format!("invalid selector {:?}: {}", selector, e)))?;
    let anchor = Selector::parse("a")
        .map_err(|e| BlogwatchError::ScrapeParse(e.to_string()))?;

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for matched in document.select(&matcher) {
        let link = if matched.value().name().eq_ignore_ascii_case("a") {
            matched
        } else {
            match matched.select(&anchor).next() {
                Some(link) => link,
                None => continue,
            }
        };

        let Some(url) = link.value().attr("href").and_then(|h| resolve_url(base, h)) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let mut title = element_text(link);
        if title.is_empty() {
            title = link
                .value()
                .attr("title")
                .map(collapse_whitespace)
                .unwrap_or_default();
        }
        if title.is_empty() && link.id() != matched.id() {
            title = element_text(matched);
        }
        if title.is_empty() {
            continue;
        }

        items.push(AcquiredItem::new(title, url));
    }

    Ok(items)
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
