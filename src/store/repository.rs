//! Source and item repositories for blogwatch.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::QueryBuilder;

use super::types::{Item, ItemFilter, NewItem, NewSource, Source};
use crate::db::DbPool;
use crate::{BlogwatchError, Result};

/// Row type for a source from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    url: String,
    feed_url: Option<String>,
    scrape_selector: Option<String>,
    last_scanned: Option<String>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            name: row.name,
            url: row.url,
            feed_url: row.feed_url,
            scrape_selector: row.scrape_selector,
            last_scanned: row.last_scanned.and_then(|s| parse_datetime(&s)),
        }
    }
}

/// Row type for an item from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    source_id: i64,
    title: String,
    url: String,
    thumbnail_url: Option<String>,
    published_at: Option<String>,
    discovered_at: String,
    is_read: bool,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            source_id: row.source_id,
            title: row.title,
            url: row.url,
            thumbnail_url: row.thumbnail_url,
            published_at: row.published_at.and_then(|s| parse_datetime(&s)),
            discovered_at: parse_datetime(&row.discovered_at).unwrap_or_else(Utc::now),
            is_read: row.is_read,
        }
    }
}

/// Repository for source operations.
pub struct SourceRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SourceRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new source.
    pub async fn create(&self, source: &NewSource) -> Result<Source> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sources (name, url, feed_url, scrape_selector)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&source.name)
        .bind(&source.url)
        .bind(&source.feed_url)
        .bind(&source.scrape_selector)
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| BlogwatchError::NotFound("source".into()))
    }

    /// Get a source by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(
            r#"
            SELECT id, name, url, feed_url, scrape_selector, last_scanned
            FROM sources
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Source::from))
    }

    /// Get a source by its display name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(
            r#"
            SELECT id, name, url, feed_url, scrape_selector, last_scanned
            FROM sources
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Source::from))
    }

    /// List all sources ordered by name.
    pub async fn list(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(
            r#"
            SELECT id, name, url, feed_url, scrape_selector, last_scanned
            FROM sources
            ORDER BY name ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Overwrite every column of a source row.
    pub async fn update(&self, source: &Source) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sources
            SET name = $1, url = $2, feed_url = $3, scrape_selector = $4, last_scanned = $5
            WHERE id = $6
            "#,
        )
        .bind(&source.name)
        .bind(&source.url)
        .bind(&source.feed_url)
        .bind(&source.scrape_selector)
        .bind(source.last_scanned.map(|dt| dt.to_rfc3339()))
        .bind(source.id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record when the source was last scanned.
    pub async fn update_last_scanned(&self, id: i64, scanned_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE sources SET last_scanned = $1 WHERE id = $2")
            .bind(scanned_at.to_rfc3339())
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Repository for item operations.
pub struct ItemRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Return the subset of `urls` already stored.
    ///
    /// The lookup is split into queries of at most `chunk_size` URLs each to
    /// stay under SQLite's bind-parameter limit.
    pub async fn existing_urls(&self, urls: &[String], chunk_size: usize) -> Result<HashSet<String>> {
        let mut existing = HashSet::new();

        for chunk in urls.chunks(chunk_size.max(1)) {
            let mut query: QueryBuilder<sqlx::Sqlite> =
                QueryBuilder::new("SELECT url FROM items WHERE url IN (");
            let mut separated = query.separated(", ");
            for url in chunk {
                separated.push_bind(url.as_str());
            }
            separated.push_unseparated(")");

            let found: Vec<String> = query.build_query_scalar().fetch_all(self.pool).await?;
            existing.extend(found);
        }

        Ok(existing)
    }

    /// Insert items in a single transaction.
    ///
    /// Either every item is stored or none is. An empty slice is a no-op.
    pub async fn insert_bulk(&self, items: &[NewItem]) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for item in items {
            let result = sqlx::query(
                r#"
                INSERT INTO items (source_id, title, url, thumbnail_url, published_at, discovered_at, is_read)
                VALUES ($1, $2, $3, $4, $5, $6, 0)
                "#,
            )
            .bind(item.source_id)
            .bind(&item.title)
            .bind(&item.url)
            .bind(&item.thumbnail_url)
            .bind(item.published_at.map(|dt| dt.to_rfc3339()))
            .bind(item.discovered_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Get an item by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, source_id, title, url, thumbnail_url, published_at, discovered_at, is_read
            FROM items
            WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Item::from))
    }

    /// List items, newest discovery first.
    pub async fn list(&self, filter: ItemFilter) -> Result<Vec<Item>> {
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
            r#"
            SELECT id, source_id, title, url, thumbnail_url, published_at, discovered_at, is_read
            FROM items
            WHERE 1 = 1
            "#,
        );

        if filter.unread_only {
            query.push(" AND is_read = 0");
        }
        if let Some(source_id) = filter.source_id {
            query.push(" AND source_id = ");
            query.push_bind(source_id);
        }
        query.push(" ORDER BY discovered_at DESC, id ASC");

        let rows: Vec<ItemRow> = query.build_query_as().fetch_all(self.pool).await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Count items of a source.
    pub async fn count_by_source(&self, source_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE source_id = $1")
            .bind(source_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Mark an item as read.
    pub async fn mark_read(&self, id: i64) -> Result<bool> {
        self.set_read(id, true).await
    }

    /// Mark an item as unread.
    pub async fn mark_unread(&self, id: i64) -> Result<bool> {
        self.set_read(id, false).await
    }

    async fn set_read(&self, id: i64, is_read: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE items SET is_read = $1 WHERE id = $2")
            .bind(is_read)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Parse a stored datetime string to DateTime<Utc>.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}
