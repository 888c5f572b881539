//! Source and item types for blogwatch.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A tracked blog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    /// Source ID.
    pub id: i64,
    /// Display name (unique).
    pub name: String,
    /// Canonical site URL.
    pub url: String,
    /// Cached feed URL, filled in after the first successful discovery.
    pub feed_url: Option<String>,
    /// CSS selector for the scrape fallback.
    pub scrape_selector: Option<String>,
    /// When the source was last scanned.
    pub last_scanned: Option<DateTime<Utc>>,
}

impl Source {
    /// Cached feed URL, treating a blank value as absent.
    pub fn feed_url(&self) -> Option<&str> {
        non_blank(self.feed_url.as_deref())
    }

    /// Scrape selector, treating a blank value as absent.
    pub fn scrape_selector(&self) -> Option<&str> {
        non_blank(self.scrape_selector.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// New source for creation.
#[derive(Debug, Clone)]
pub struct NewSource {
    /// Display name.
    pub name: String,
    /// Canonical site URL.
    pub url: String,
    /// Known feed URL.
    pub feed_url: Option<String>,
    /// CSS selector for the scrape fallback.
    pub scrape_selector: Option<String>,
}

impl NewSource {
    /// Create a new source.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            feed_url: None,
            scrape_selector: None,
        }
    }

    /// Set the feed URL.
    pub fn with_feed_url(mut self, feed_url: impl Into<String>) -> Self {
        self.feed_url = Some(feed_url.into());
        self
    }

    /// Set the scrape selector.
    pub fn with_scrape_selector(mut self, selector: impl Into<String>) -> Self {
        self.scrape_selector = Some(selector.into());
        self
    }
}

/// A stored article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Item ID.
    pub id: i64,
    /// Owning source.
    pub source_id: i64,
    /// Item title.
    pub title: String,
    /// Canonical URL (unique).
    pub url: String,
    /// Preview image.
    pub thumbnail_url: Option<String>,
    /// Publication time reported by the origin.
    pub published_at: Option<DateTime<Utc>>,
    /// When the scan that found this item ran.
    pub discovered_at: DateTime<Utc>,
    /// Whether the item has been read.
    pub is_read: bool,
}

/// New item for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Owning source.
    pub source_id: i64,
    /// Item title.
    pub title: String,
    /// Canonical URL.
    pub url: String,
    /// Preview image.
    pub thumbnail_url: Option<String>,
    /// Publication time reported by the origin.
    pub published_at: Option<DateTime<Utc>>,
    /// Discovery time, shared by every item of one batch.
    pub discovered_at: DateTime<Utc>,
}

impl NewItem {
    /// Create a new item.
    pub fn new(
        source_id: i64,
        title: impl Into<String>,
        url: impl Into<String>,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_id,
            title: title.into(),
            url: url.into(),
            thumbnail_url: None,
            published_at: None,
            discovered_at,
        }
    }

    /// Set the thumbnail URL.
    pub fn with_thumbnail_url(mut self, thumbnail_url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(thumbnail_url.into());
        self
    }

    /// Set the published date.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Filter for listing items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFilter {
    /// Only unread items.
    pub unread_only: bool,
    /// Only items of this source.
    pub source_id: Option<i64>,
}

impl ItemFilter {
    /// Create an empty filter (all items).
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to unread items.
    pub fn unread(mut self) -> Self {
        self.unread_only = true;
        self
    }

    /// Restrict to one source.
    pub fn for_source(mut self, source_id: i64) -> Self {
        self.source_id = Some(source_id);
        self
    }
}
