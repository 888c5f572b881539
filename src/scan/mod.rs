//! Source scanning.
//!
//! [`Scanner::scan_one`] runs the whole pipeline for one source: acquire
//! items from its feed (or scrape its page), drop duplicates, resolve
//! thumbnails, store the new items and stamp the source as scanned.
//! [`Scanner::scan_all`] fans that out over a pool of workers, each with its
//! own database handle.

pub mod types;

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::acquire::{AcquiredItem, FeedAcquirer, ScrapeAcquirer};
use crate::config::ScanSettings;
use crate::db::Database;
use crate::dedup;
use crate::http::build_client;
use crate::store::{ItemRepository, NewItem, Source, SourceRepository};
use crate::thumbnail::{FeedMetadata, ThumbnailResolver};
use crate::{BlogwatchError, Result};

pub use types::{ScanResult, ScanSummary, ScanTier};

/// Scans sources for new items.
///
/// Cloning is cheap; clones share the underlying HTTP connection pool.
#[derive(Debug, Clone)]
pub struct Scanner {
    feeds: FeedAcquirer,
    scraper: ScrapeAcquirer,
    thumbnails: ThumbnailResolver,
    chunk_size: usize,
}

/// Items acquired for one source and the tier that produced them.
struct Acquisition {
    items: Vec<AcquiredItem>,
    meta: FeedMetadata,
    tier: ScanTier,
    error: Option<String>,
}

impl Scanner {
    /// Create a scanner from resolved settings.
    pub fn new(settings: &ScanSettings) -> Result<Self> {
        let client = build_client(settings)?;
        let max_bytes = settings.max_body_bytes;

        Ok(Self {
            feeds: FeedAcquirer::new(client.clone(), settings.feed_timeout, max_bytes),
            scraper: ScrapeAcquirer::new(client.clone(), settings.scrape_timeout, max_bytes),
            thumbnails: ThumbnailResolver::new(client, settings.thumbnail_timeout, max_bytes),
            chunk_size: settings.existence_chunk_size,
        })
    }

    /// Scan one source and store whatever new items it has.
    ///
    /// Never fails: acquisition and storage errors are recorded in the
    /// returned result, and the source's last-scan time is always updated.
    pub async fn scan_one(&self, db: &Database, source: &Source) -> ScanResult {
        debug!("Scanning source {} ({})", source.name, source.url);

        let mut result = ScanResult::new(&source.name);
        let mut storage_errors = Vec::new();

        let acquired = self.acquire(db, source, &mut storage_errors).await;
        result.tier = acquired.tier;

        let unique = dedup::in_batch(acquired.items);
        result.total_found = unique.len();

        let existing =
            match dedup::existing_in_storage(db.pool(), &unique, self.chunk_size).await {
                Ok(existing) => existing,
                Err(e) => {
                    warn!("Existence check failed for {}: {}", source.name, e);
                    storage_errors.push(e.to_string());
                    Default::default()
                }
            };
        let fresh = dedup::without_existing(unique, &existing);

        if !fresh.is_empty() {
            let batch = self.prepare_batch(source.id, fresh, &acquired.meta).await;
            match ItemRepository::new(db.pool()).insert_bulk(&batch).await {
                Ok(inserted) => result.new_items = inserted,
                Err(e) => {
                    warn!("Failed to store items for {}: {}", source.name, e);
                    storage_errors.push(e.to_string());
                }
            }
        }

        if let Err(e) = SourceRepository::new(db.pool())
            .update_last_scanned(source.id, Utc::now())
            .await
        {
            warn!("Failed to update last scan time for {}: {}", source.name, e);
            storage_errors.push(e.to_string());
        }

        result.error = combine_errors(acquired.error, storage_errors);

        if result.new_items > 0 {
            info!(
                "Source {} scanned: {} new item(s) of {} via {}",
                source.name, result.new_items, result.total_found, result.tier
            );
        } else {
            debug!(
                "Source {} scanned: no new items ({} found via {})",
                source.name, result.total_found, result.tier
            );
        }

        result
    }

    /// Run the feed tier, then the scrape tier when the feed yielded nothing.
    async fn acquire(
        &self,
        db: &Database,
        source: &Source,
        storage_errors: &mut Vec<String>,
    ) -> Acquisition {
        let mut acquired = Acquisition {
            items: Vec::new(),
            meta: FeedMetadata::default(),
            tier: ScanTier::None,
            error: None,
        };

        let mut feed_url = source.feed_url().map(str::to_string);
        if feed_url.is_none() {
            if let Some(found) = self.feeds.discover(&source.url).await {
                info!("Discovered feed for {}: {}", source.name, found);
                let mut updated = source.clone();
                updated.feed_url = Some(found.clone());
                if let Err(e) = SourceRepository::new(db.pool()).update(&updated).await {
                    warn!("Failed to save feed URL for {}: {}", source.name, e);
                    storage_errors.push(e.to_string());
                }
                feed_url = Some(found);
            }
        }

        if let Some(feed_url) = &feed_url {
            match self.feeds.parse(feed_url).await {
                Ok(parsed) => {
                    debug!("Feed {} yielded {} item(s)", feed_url, parsed.items.len());
                    acquired.items = parsed.items;
                    acquired.meta = parsed.meta;
                    acquired.tier = ScanTier::Feed;
                }
                Err(e) => {
                    warn!("Feed tier failed for {}: {}", source.name, e);
                    acquired.error = Some(e.to_string());
                }
            }
        }

        if acquired.items.is_empty() {
            if let Some(selector) = source.scrape_selector() {
                match self.scraper.scrape(&source.url, selector).await {
                    Ok(items) => {
                        debug!("Scraper yielded {} item(s) for {}", items.len(), source.name);
                        acquired.items = items;
                        acquired.meta = FeedMetadata::default();
                        acquired.tier = ScanTier::Scraper;
                        acquired.error = None;
                    }
                    Err(e) => {
                        warn!("Scrape tier failed for {}: {}", source.name, e);
                        acquired.error = Some(match acquired.error.take() {
                            Some(feed_error) => format!("RSS: {}; Scraper: {}", feed_error, e),
                            None => e.to_string(),
                        });
                    }
                }
            }
        }

        acquired
    }

    /// Resolve thumbnails and build the insert batch, one item at a time.
    async fn prepare_batch(
        &self,
        source_id: i64,
        items: Vec<AcquiredItem>,
        meta: &FeedMetadata,
    ) -> Vec<NewItem> {
        let discovered_at = Utc::now();
        let mut batch = Vec::with_capacity(items.len());

        for item in items {
            let thumbnail = self.thumbnails.resolve(&item.url, &item.hints, meta).await;

            let mut new_item = NewItem::new(source_id, item.title, item.url, discovered_at);
            if let Some(thumbnail) = thumbnail {
                new_item = new_item.with_thumbnail_url(thumbnail);
            }
            if let Some(published_at) = item.published_at {
                new_item = new_item.with_published_at(published_at);
            }
            batch.push(new_item);
        }

        batch
    }

    /// Scan every source in `sources`, returning results in input order.
    ///
    /// With more than one worker, each worker opens its own handle on the
    /// database file before any source is scanned. If any handle cannot be
    /// opened the whole call fails and nothing is scanned.
    pub async fn scan_all(
        &self,
        db: &Database,
        sources: Vec<Source>,
        workers: usize,
    ) -> Result<Vec<ScanResult>> {
        if workers <= 1 {
            let mut results = Vec::with_capacity(sources.len());
            for source in &sources {
                results.push(self.scan_one(db, source).await);
            }
            return Ok(results);
        }

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            match db.open_handle().await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!("Failed to open worker database handle: {}", e);
                    for handle in &handles {
                        handle.close().await;
                    }
                    return Err(e);
                }
            }
        }

        info!("Scanning {} source(s) with {} workers", sources.len(), workers);

        let total = sources.len();
        let (tx, rx) = mpsc::unbounded_channel();
        for job in sources.into_iter().enumerate() {
            // The receiver is alive until the workers finish.
            let _ = tx.send(job);
        }
        drop(tx);
        let queue = Arc::new(Mutex::new(rx));

        let tasks = handles.into_iter().map(|handle| {
            let scanner = self.clone();
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let mut done = Vec::new();
                loop {
                    let job = queue.lock().await.recv().await;
                    let Some((index, source)) = job else {
                        break;
                    };
                    done.push((index, scanner.scan_one(&handle, &source).await));
                }
                handle.close().await;
                done
            })
        });

        let mut slots: Vec<Option<ScanResult>> = vec![None; total];
        for joined in join_all(tasks).await {
            let done = joined.map_err(|e| BlogwatchError::Worker(e.to_string()))?;
            for (index, result) in done {
                slots[index] = Some(result);
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Scan every stored source, ordered by name.
    pub async fn scan_all_sources(&self, db: &Database, workers: usize) -> Result<Vec<ScanResult>> {
        let sources = SourceRepository::new(db.pool()).list().await?;
        self.scan_all(db, sources, workers).await
    }

    /// Scan the source called `name`.
    ///
    /// Returns `Ok(None)` when no such source exists.
    pub async fn scan_by_name(&self, db: &Database, name: &str) -> Result<Option<ScanResult>> {
        match SourceRepository::new(db.pool()).get_by_name(name).await? {
            Some(source) => Ok(Some(self.scan_one(db, &source).await)),
            None => Ok(None),
        }
    }
}

/// Join the acquisition error and any storage errors into one message.
fn combine_errors(acquire: Option<String>, storage: Vec<String>) -> Option<String> {
    let parts: Vec<String> = acquire.into_iter().chain(storage).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}
