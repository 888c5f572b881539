//! Feed discovery and parsing.
//!
//! Discovery looks for `<link rel="alternate">` tags on the site's home page
//! and then probes a handful of conventional feed paths. Parsing accepts
//! anything feed-rs understands (RSS, Atom, JSON Feed).

use std::time::Duration;

use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::AcquiredItem;
use crate::http::{self, resolve_url};
use crate::thumbnail::{Enclosure, FeedMetadata, ThumbnailHints};
use crate::{BlogwatchError, Result};

/// `<link rel="alternate">` types accepted during discovery, in priority order.
const FEED_LINK_TYPES: &[&str] = &[
    "application/rss+xml",
    "application/atom+xml",
    "application/feed+json",
    "application/xml",
    "text/xml",
];

/// Conventional feed locations probed when the page advertises none.
const COMMON_FEED_PATHS: &[&str] = &[
    "/feed",
    "/feed/",
    "/rss",
    "/rss/",
    "/feed.xml",
    "/rss.xml",
    "/atom.xml",
    "/index.xml",
];

/// A parsed feed reduced to what the scan pipeline needs.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Feed-level metadata used for thumbnail fallback.
    pub meta: FeedMetadata,
    /// Items with a usable title and link, in feed order.
    pub items: Vec<AcquiredItem>,
}

/// Discovers and parses syndication feeds.
#[derive(Debug, Clone)]
pub struct FeedAcquirer {
    client: Client,
    timeout: Duration,
    max_bytes: u64,
}

impl FeedAcquirer {
    /// Create an acquirer using `timeout` for every request it makes.
    pub fn new(client: Client, timeout: Duration, max_bytes: u64) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    /// Find a feed URL for the site at `source_url`.
    ///
    /// Any failure along the way means "no feed"; discovery never errors.
    pub async fn discover(&self, source_url: &str) -> Option<String> {
        let page = match http::fetch(&self.client, source_url, self.timeout, self.max_bytes).await
        {
            Ok(page) => page,
            Err(e) => {
                debug!("Feed discovery fetch failed for {}: {}", source_url, e);
                return None;
            }
        };

        if let Some(found) = find_alternate_link(&page.text(), &page.url) {
            debug!("Feed for {} advertised at {}", source_url, found);
            return Some(found);
        }

        let base = Url::parse(source_url.trim()).ok()?;
        for path in COMMON_FEED_PATHS {
            let Some(candidate) = resolve_url(&base, path) else {
                continue;
            };
            if self.is_valid_feed(&candidate).await {
                debug!("Feed for {} found at {}", source_url, candidate);
                return Some(candidate);
            }
        }

        debug!("No feed discovered for {}", source_url);
        None
    }

    /// Fetch and parse the feed at `feed_url`.
    pub async fn parse(&self, feed_url: &str) -> Result<ParsedFeed> {
        let fetched = http::fetch(&self.client, feed_url, self.timeout, self.max_bytes)
            .await
            .map_err(|e| BlogwatchError::FeedFetch(e.to_string()))?;

        parse_feed(&fetched.body, Some(&fetched.url))
    }

    async fn is_valid_feed(&self, url: &str) -> bool {
        let Ok(fetched) = http::fetch(&self.client, url, self.timeout, self.max_bytes).await else {
            return false;
        };
        match parser::parse(fetched.body.as_slice()) {
            Ok(feed) => {
                !feed.entries.is_empty()
                    || feed
                        .title
                        .map(|t| !t.content.trim().is_empty())
                        .unwrap_or(false)
            }
            Err(_) => false,
        }
    }
}

/// Return the first resolvable alternate feed link in `html`.
fn find_alternate_link(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);

    for feed_type in FEED_LINK_TYPES {
        let css = format!(r#"link[rel~="alternate"][type="{}"]"#, feed_type);
        let Ok(selector) = Selector::parse(&css) else {
            continue;
        };
        let Some(link) = document.select(&selector).next() else {
            continue;
        };
        if let Some(resolved) = link.value().attr("href").and_then(|h| resolve_url(base, h)) {
            return Some(resolved);
        }
    }

    None
}

/// Parse feed bytes into a [`ParsedFeed`].
///
/// Relative item links are resolved against `base` when given. Entries
/// without a title or link are skipped.
pub fn parse_feed(bytes: &[u8], base: Option<&Url>) -> Result<ParsedFeed> {
    let feed = parser::parse(bytes).map_err(|e| BlogwatchError::FeedParse(e.to_string()))?;

    let meta = feed_metadata(&feed);
    let enclosures = rss_enclosures(bytes)
        .filter(|found| found.len() == feed.entries.len())
        .unwrap_or_default();
    let items = feed
        .entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let enclosure = enclosures.get(i).and_then(Option::as_ref);
            convert_entry(entry, enclosure, base)
        })
        .collect();

    Ok(ParsedFeed { meta, items })
}

fn feed_metadata(feed: &Feed) -> FeedMetadata {
    let title = feed
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty());
    let image = feed
        .logo
        .as_ref()
        .or(feed.icon.as_ref())
        .map(|img| img.uri.trim().to_string())
        .filter(|uri| !uri.is_empty());

    FeedMetadata { title, image }
}

/// The `<enclosure>` of every RSS item, in document order.
///
/// feed-rs folds RSS enclosures into media content, so they are read again
/// here to keep them in their own tier. `None` when `bytes` is not RSS.
fn rss_enclosures(bytes: &[u8]) -> Option<Vec<Option<Enclosure>>> {
    let channel = rss::Channel::read_from(bytes).ok()?;
    let enclosures = channel
        .items()
        .iter()
        .map(|item| {
            item.enclosure()
                .map(|e| Enclosure {
                    url: e.url().trim().to_string(),
                    mime_type: Some(e.mime_type().trim().to_string()).filter(|t| !t.is_empty()),
                })
                .filter(|e| !e.url.is_empty())
        })
        .collect();
    Some(enclosures)
}

fn convert_entry(
    entry: &Entry,
    rss_enclosure: Option<&Enclosure>,
    base: Option<&Url>,
) -> Option<AcquiredItem> {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();
    let link = entry_link(entry)?;
    let url = match base {
        Some(base) => resolve_url(base, &link)?,
        None => link,
    };
    if title.is_empty() {
        return None;
    }

    Some(AcquiredItem {
        title,
        url,
        published_at: entry.published.or(entry.updated),
        hints: thumbnail_hints(entry, rss_enclosure),
    })
}

/// The entry's page link: an alternate (or untyped) link, else the first
/// link that is not an enclosure.
fn entry_link(entry: &Entry) -> Option<String> {
    let is_rel = |rel: Option<&str>, want: &str| rel.is_some_and(|r| r.eq_ignore_ascii_case(want));

    entry
        .links
        .iter()
        .find(|l| l.rel.is_none() || is_rel(l.rel.as_deref(), "alternate"))
        .or_else(|| {
            entry
                .links
                .iter()
                .find(|l| !is_rel(l.rel.as_deref(), "enclosure"))
        })
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
}

fn thumbnail_hints(entry: &Entry, rss_enclosure: Option<&Enclosure>) -> ThumbnailHints {
    let folded = rss_enclosure.map(|e| normalize_url(&e.url));

    let media_content = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .filter(|c| {
            c.content_type
                .as_ref()
                .map(|t| t.to_string().starts_with("image/"))
                .unwrap_or(true)
        })
        .filter_map(|c| c.url.as_ref().map(|u| u.to_string()))
        .find(|url| folded.as_deref() != Some(url.as_str()));

    let media_thumbnail = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.trim().to_string())
        .find(|uri| !uri.is_empty());

    let link_enclosures = entry
        .links
        .iter()
        .filter(|l| {
            l.rel
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case("enclosure"))
        })
        .map(|l| Enclosure {
            url: l.href.trim().to_string(),
            mime_type: l.media_type.clone(),
        });
    let enclosures = rss_enclosure.cloned().into_iter().chain(link_enclosures).collect();

    ThumbnailHints {
        media_content,
        media_thumbnail,
        enclosures,
    }
}

fn normalize_url(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}
