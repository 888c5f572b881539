//! Thumbnail resolution.
//!
//! Candidates are tried in a fixed order: media content, media thumbnail,
//! the feed-level image, image enclosures, and finally the `og:image` meta
//! tag of the item's page. Only the last tier touches the network.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::http::{self, resolve_url};

/// An enclosure attached to a feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: Option<String>,
}

/// Thumbnail references carried by a feed entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailHints {
    /// First image-typed (or untyped) media content URL.
    pub media_content: Option<String>,
    /// First media thumbnail URL.
    pub media_thumbnail: Option<String>,
    pub enclosures: Vec<Enclosure>,
}

/// Feed-level data shared by every entry of one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedMetadata {
    pub title: Option<String>,
    /// Channel logo or icon.
    pub image: Option<String>,
}

/// Picks a thumbnail for an item, fetching the item page as a last resort.
#[derive(Debug, Clone)]
pub struct ThumbnailResolver {
    client: Client,
    timeout: Duration,
    max_bytes: u64,
}

impl ThumbnailResolver {
    pub fn new(client: Client, timeout: Duration, max_bytes: u64) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    /// Resolve a thumbnail for the item at `item_url`.
    ///
    /// Returns `None` when no tier yields a usable URL. Failures of the page
    /// fetch are never surfaced.
    pub async fn resolve(
        &self,
        item_url: &str,
        hints: &ThumbnailHints,
        feed: &FeedMetadata,
    ) -> Option<String> {
        if let Some(url) = from_hints(hints, feed) {
            return Some(url);
        }
        self.from_open_graph(item_url).await
    }

    /// Fetch `page_url` and return its `og:image`, resolved to an absolute URL.
    pub async fn from_open_graph(&self, page_url: &str) -> Option<String> {
        match http::fetch(&self.client, page_url, self.timeout, self.max_bytes).await {
            Ok(page) => extract_og_image(&page.text(), &page.url),
            Err(e) => {
                debug!("Thumbnail page fetch failed for {}: {}", page_url, e);
                None
            }
        }
    }
}

/// Resolve a thumbnail from the data already present in the feed.
pub fn from_hints(hints: &ThumbnailHints, feed: &FeedMetadata) -> Option<String> {
    non_blank(hints.media_content.as_deref())
        .or_else(|| non_blank(hints.media_thumbnail.as_deref()))
        .or_else(|| non_blank(feed.image.as_deref()))
        .or_else(|| {
            hints
                .enclosures
                .iter()
                .filter(|e| is_image(e.mime_type.as_deref()))
                .find_map(|e| non_blank(Some(e.url.as_str())))
        })
}

/// The `og:image` of an HTML document, resolved against `base`.
pub fn extract_og_image(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(r#"meta[property="og:image"], meta[name="og:image"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(|content| resolve_url(base, content))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_image(mime_type: Option<&str>) -> bool {
    mime_type.is_some_and(|t| t.trim().to_ascii_lowercase().starts_with("image/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enclosure(url: &str, mime_type: Option<&str>) -> Enclosure {
        Enclosure {
            url: url.to_string(),
            mime_type: mime_type.map(str::to_string),
        }
    }

    fn all_tiers() -> (ThumbnailHints, FeedMetadata) {
        let hints = ThumbnailHints {
            media_content: Some("https://img.example.com/content.jpg".to_string()),
            media_thumbnail: Some("https://img.example.com/thumb.jpg".to_string()),
            enclosures: vec![enclosure(
                "https://img.example.com/enclosure.jpg",
                Some("image/jpeg"),
            )],
        };
        let feed = FeedMetadata {
            title: Some("Feed".to_string()),
            image: Some("https://img.example.com/logo.png".to_string()),
        };
        (hints, feed)
    }

    #[test]
    fn test_from_hints_order() {
        let (mut hints, mut feed) = all_tiers();
        assert_eq!(
            from_hints(&hints, &feed).as_deref(),
            Some("https://img.example.com/content.jpg")
        );

        hints.media_content = None;
        assert_eq!(
            from_hints(&hints, &feed).as_deref(),
            Some("https://img.example.com/thumb.jpg")
        );

        hints.media_thumbnail = Some("   ".to_string());
        assert_eq!(
            from_hints(&hints, &feed).as_deref(),
            Some("https://img.example.com/logo.png")
        );

        feed.image = None;
        assert_eq!(
            from_hints(&hints, &feed).as_deref(),
            Some("https://img.example.com/enclosure.jpg")
        );

        hints.enclosures.clear();
        assert!(from_hints(&hints, &feed).is_none());
    }

    #[test]
    fn test_from_hints_skips_non_image_enclosures() {
        let hints = ThumbnailHints {
            enclosures: vec![
                enclosure("https://example.com/episode.mp3", Some("audio/mpeg")),
                enclosure("https://example.com/untyped.bin", None),
                enclosure("https://example.com/cover.png", Some("IMAGE/PNG")),
            ],
            ..Default::default()
        };

        assert_eq!(
            from_hints(&hints, &FeedMetadata::default()).as_deref(),
            Some("https://example.com/cover.png")
        );
    }

    #[test]
    fn test_extract_og_image() {
        let base = Url::parse("https://example.com/posts/1").unwrap();

        let html = r#"<html><head>
            <meta property="og:title" content="Post">
            <meta property="og:image" content="/images/cover.jpg">
        </head></html>"#;
        assert_eq!(
            extract_og_image(html, &base).as_deref(),
            Some("https://example.com/images/cover.jpg")
        );

        let by_name = r#"<html><head><meta name="og:image" content="https://cdn.example.com/a.png"></head></html>"#;
        assert_eq!(
            extract_og_image(by_name, &base).as_deref(),
            Some("https://cdn.example.com/a.png")
        );

        let blank = r#"<html><head><meta property="og:image" content="  "></head></html>"#;
        assert!(extract_og_image(blank, &base).is_none());

        assert!(extract_og_image("<html></html>", &base).is_none());
    }

    #[tokio::test]
    async fn test_resolve_prefers_hints_without_fetching() {
        let resolver = ThumbnailResolver::new(Client::new(), Duration::from_secs(1), 1024);
        let (hints, feed) = all_tiers();

        // The item URL is unreachable, so a fetch would yield None.
        let resolved = resolver
            .resolve("http://127.0.0.1:1/unreachable", &hints, &feed)
            .await;
        assert_eq!(resolved.as_deref(), Some("https://img.example.com/content.jpg"));
    }

    #[tokio::test]
    async fn test_resolve_fetch_failure_is_none() {
        let resolver = ThumbnailResolver::new(Client::new(), Duration::from_secs(1), 1024);
        let resolved = resolver
            .resolve(
                "not a url",
                &ThumbnailHints::default(),
                &FeedMetadata::default(),
            )
            .await;
        assert!(resolved.is_none());
    }
}
