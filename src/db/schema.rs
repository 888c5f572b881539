//! Database schema and migrations for blogwatch.
//!
//! Migrations are applied in order the first time a database is opened
//! or upgraded; the schema_version table records which ones ran.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Sources and items
    r#"
-- Tracked blogs
CREATE TABLE sources (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL UNIQUE,
    url             TEXT NOT NULL,
    feed_url        TEXT,                   -- cached after first discovery
    scrape_selector TEXT,                   -- CSS selector for the scrape fallback
    last_scanned    TEXT
);

-- Discovered articles, unique by URL
CREATE TABLE items (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id       INTEGER NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
    title           TEXT NOT NULL,
    url             TEXT NOT NULL UNIQUE,
    thumbnail_url   TEXT,
    published_at    TEXT,
    discovered_at   TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_items_source_id ON items(source_id);
CREATE INDEX idx_items_discovered_at ON items(discovered_at);
"#,
];
