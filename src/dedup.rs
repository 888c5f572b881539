//! Item deduplication by URL.
//!
//! Duplicates are removed first within one acquisition batch, then against
//! URLs already persisted. Storage lookups are chunked to stay under the
//! database's bound-parameter limit.

use std::collections::HashSet;

use crate::db::DbPool;
use crate::store::ItemRepository;
use crate::Result;

/// Key used to detect duplicate items.
pub trait DedupKey {
    fn dedup_key(&self) -> &str;
}

/// Remove duplicates within one batch, keeping the first occurrence.
pub fn in_batch<T: DedupKey>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.dedup_key().to_string()))
        .collect()
}

/// Drop every item whose key is in `existing`.
pub fn without_existing<T: DedupKey>(items: Vec<T>, existing: &HashSet<String>) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| !existing.contains(item.dedup_key()))
        .collect()
}

/// Look up which of `items` are already stored, `chunk_size` URLs per query.
pub async fn existing_in_storage<T: DedupKey>(
    pool: &DbPool,
    items: &[T],
    chunk_size: usize,
) -> Result<HashSet<String>> {
    let urls: Vec<String> = items.iter().map(|i| i.dedup_key().to_string()).collect();
    ItemRepository::new(pool).existing_urls(&urls, chunk_size).await
}
