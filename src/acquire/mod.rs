//! Item acquisition: syndication feeds first, HTML scraping as fallback.

pub mod feed;
pub mod scrape;

use chrono::{DateTime, Utc};

use crate::dedup::DedupKey;
use crate::thumbnail::ThumbnailHints;

pub use feed::{FeedAcquirer, ParsedFeed};
pub use scrape::ScrapeAcquirer;

/// An item candidate produced by one of the acquisition tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredItem {
    /// Trimmed, non-empty title.
    pub title: String,
    /// Absolute item URL, the dedup key.
    pub url: String,
    /// Publication time from the origin, never fabricated.
    pub published_at: Option<DateTime<Utc>>,
    /// Thumbnail references carried by the origin format.
    pub hints: ThumbnailHints,
}

impl AcquiredItem {
    /// Create an item with no date and no thumbnail hints.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            published_at: None,
            hints: ThumbnailHints::default(),
        }
    }
}

impl DedupKey for AcquiredItem {
    fn dedup_key(&self) -> &str {
        &self.url
    }
}
