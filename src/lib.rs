//! blogwatch - blog ingestion core
//!
//! Discovers and parses blog feeds, falls back to scraping pages with a CSS
//! selector, resolves thumbnails, and stores new items without duplicates.

pub mod acquire;
pub mod cli;
pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod http;
pub mod logging;
pub mod scan;
pub mod store;
pub mod thumbnail;

pub use acquire::{AcquiredItem, FeedAcquirer, ParsedFeed, ScrapeAcquirer};
pub use config::{Config, ScanSettings};
pub use db::Database;
pub use error::{BlogwatchError, Result};
pub use scan::{ScanResult, ScanSummary, ScanTier, Scanner};
pub use store::{Item, ItemFilter, ItemRepository, NewItem, NewSource, Source, SourceRepository};
pub use thumbnail::{FeedMetadata, ThumbnailHints, ThumbnailResolver};
