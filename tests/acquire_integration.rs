//! Acquirer and thumbnail tests against wiremock servers.

mod common;

use std::time::Duration;

use blogwatch::http::build_client;
use blogwatch::thumbnail::{FeedMetadata, ThumbnailHints};
use blogwatch::{BlogwatchError, FeedAcquirer, ScrapeAcquirer, ThumbnailResolver};
use common::{html_page, mount_feed, mount_html, mount_status, rss_feed, test_settings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MAX_BYTES: u64 = 64 * 1024;

fn feed_acquirer() -> FeedAcquirer {
    let client = build_client(&test_settings()).unwrap();
    FeedAcquirer::new(client, Duration::from_secs(5), MAX_BYTES)
}

fn scrape_acquirer() -> ScrapeAcquirer {
    let client = build_client(&test_settings()).unwrap();
    ScrapeAcquirer::new(client, Duration::from_secs(5), MAX_BYTES)
}

fn thumbnail_resolver() -> ThumbnailResolver {
    let client = build_client(&test_settings()).unwrap();
    ThumbnailResolver::new(client, Duration::from_secs(2), MAX_BYTES)
}

#[tokio::test]
async fn test_discover_prefers_rss_link() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        html_page(
            r#"<link rel="alternate" type="application/atom+xml" href="/atom">
               <link rel="alternate" type="application/rss+xml" href="/rss">"#,
            "",
        ),
    )
    .await;

    let found = feed_acquirer().discover(&format!("{}/", server.uri())).await;
    assert_eq!(found, Some(format!("{}/rss", server.uri())));
}

#[tokio::test]
async fn test_discover_skips_invalid_candidates() {
    let server = MockServer::start().await;
    mount_html(&server, "/", html_page("", "<p>plain</p>")).await;
    // Serves HTML, not a feed.
    mount_html(&server, "/feed", html_page("", "<p>not a feed</p>")).await;
    // Parses, but has no title and no entries.
    mount_feed(
        &server,
        "/rss",
        r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#.to_string(),
    )
    .await;
    mount_feed(&server, "/atom.xml", rss_feed("Titled", &[])).await;

    let found = feed_acquirer().discover(&format!("{}/", server.uri())).await;
    assert_eq!(found, Some(format!("{}/atom.xml", server.uri())));
}

#[tokio::test]
async fn test_discover_nothing() {
    let server = MockServer::start().await;
    mount_status(&server, "/", 503).await;

    assert!(feed_acquirer()
        .discover(&format!("{}/", server.uri()))
        .await
        .is_none());
    assert!(feed_acquirer().discover("not a url").await.is_none());
}

#[tokio::test]
async fn test_parse_fetch_errors() {
    let server = MockServer::start().await;
    mount_status(&server, "/gone", 404).await;
    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(MAX_BYTES as usize + 1)))
        .mount(&server)
        .await;

    let acquirer = feed_acquirer();

    let err = acquirer
        .parse(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to fetch feed: status 404");

    let err = acquirer
        .parse(&format!("{}/huge", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, BlogwatchError::FeedFetch(_)));
}

#[tokio::test]
async fn test_parse_malformed_feed() {
    let server = MockServer::start().await;
    mount_feed(&server, "/feed.xml", "This is not XML".to_string()).await;

    let err = feed_acquirer()
        .parse(&format!("{}/feed.xml", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, BlogwatchError::FeedParse(_)));
}

#[tokio::test]
async fn test_parse_feed_items() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/feed.xml",
        rss_feed(
            "Items",
            &[("One", "https://blog.example.com/1"), ("", "https://blog.example.com/2")],
        ),
    )
    .await;

    let parsed = feed_acquirer()
        .parse(&format!("{}/feed.xml", server.uri()))
        .await
        .unwrap();
    assert_eq!(parsed.meta.title.as_deref(), Some("Items"));
    assert_eq!(parsed.items.len(), 1);
    assert_eq!(parsed.items[0].url, "https://blog.example.com/1");
}

#[tokio::test]
async fn test_scrape_errors() {
    let server = MockServer::start().await;
    mount_html(&server, "/", html_page("", r#"<a href="/x">X</a>"#)).await;

    let acquirer = scrape_acquirer();

    let err = acquirer
        .scrape(&format!("{}/missing", server.uri()), "a")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to fetch page: status 404");

    let err = acquirer
        .scrape(&format!("{}/", server.uri()), "a[")
        .await
        .unwrap_err();
    assert!(matches!(err, BlogwatchError::ScrapeParse(_)));
}

#[tokio::test]
async fn test_scrape_invalid_page_url_is_parse_error() {
    let acquirer = scrape_acquirer();

    for page_url in ["not a url", "ftp://example.com/blog"] {
        let err = acquirer.scrape(page_url, "a").await.unwrap_err();
        assert!(
            matches!(err, BlogwatchError::ScrapeParse(_)),
            "{page_url}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_scrape_resolves_against_page() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/blog/",
        html_page(
            "",
            r#"<ul><li><a href="first">First</a></li><li><a href="/second">Second</a></li></ul>"#,
        ),
    )
    .await;

    let items = scrape_acquirer()
        .scrape(&format!("{}/blog/", server.uri()), "li")
        .await
        .unwrap();
    let urls: Vec<_> = items.iter().map(|i| i.url.clone()).collect();
    assert_eq!(
        urls,
        [
            format!("{}/blog/first", server.uri()),
            format!("{}/second", server.uri())
        ]
    );
}

#[tokio::test]
async fn test_open_graph_follows_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new/post", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/new/post",
        html_page(r#"<meta property="og:image" content="cover.jpg">"#, ""),
    )
    .await;

    let resolved = thumbnail_resolver()
        .resolve(
            &format!("{}/old", server.uri()),
            &ThumbnailHints::default(),
            &FeedMetadata::default(),
        )
        .await;
    assert_eq!(resolved, Some(format!("{}/new/cover.jpg", server.uri())));
}

#[tokio::test]
async fn test_open_graph_missing() {
    let server = MockServer::start().await;
    mount_html(&server, "/post", html_page("", "<p>no meta</p>")).await;

    let resolver = thumbnail_resolver();
    assert!(resolver
        .from_open_graph(&format!("{}/post", server.uri()))
        .await
        .is_none());
    assert!(resolver
        .from_open_graph(&format!("{}/absent", server.uri()))
        .await
        .is_none());
}
