//! Test helpers for integration tests.
//!
//! Provides database setup, scanner settings and feed/page fixtures served
//! through wiremock.

#![allow(dead_code)]

use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use blogwatch::{Database, NewSource, ScanSettings, Source, SourceRepository};

/// Settings with short deadlines for local mock servers.
pub fn test_settings() -> ScanSettings {
    ScanSettings {
        feed_timeout: Duration::from_secs(5),
        scrape_timeout: Duration::from_secs(5),
        thumbnail_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(2),
        ..ScanSettings::default()
    }
}

/// Open a file-backed database inside a fresh temporary directory.
///
/// Keep the returned directory alive for as long as the database is used.
pub async fn temp_database() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(dir.path().join("blogwatch.db")).await.unwrap();
    (dir, db)
}

/// Insert a source and return it.
pub async fn add_source(db: &Database, source: NewSource) -> Source {
    SourceRepository::new(db.pool()).create(&source).await.unwrap()
}

/// Reload a source by id.
pub async fn reload_source(db: &Database, id: i64) -> Source {
    SourceRepository::new(db.pool())
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
}

/// Build an RSS 2.0 document with `(title, link)` items.
pub fn rss_feed(title: &str, items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "    <item>\n      <title>{}</title>\n      <link>{}</link>\n    </item>\n",
                title, link
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>{}</title>
    <link>https://example.com/</link>
    <description>Fixture feed</description>
{}  </channel>
</rss>"#,
        title, items
    )
}

/// Build an HTML document from `head` and `body` fragments.
pub fn html_page(head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Fixture</title>{}</head><body>{}</body></html>",
        head, body
    )
}

/// Serve `body` as RSS at `route`.
pub async fn mount_feed(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// Serve `body` as HTML at `route`.
pub async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// Answer `route` with a bare status code.
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Answer `route` with 404 and fail verification if it is ever requested.
pub async fn mount_never_requested(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .named(format!("unexpected GET {route}"))
        .mount(server)
        .await;
}
