//! Shared HTTP client and bounded page fetching.
//!
//! Every fetch in the scan pipeline goes through [`fetch`], which applies a
//! per-request deadline, rejects non-2xx responses and caps the body size.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::ScanSettings;
use crate::{BlogwatchError, Result};

/// Why a fetch failed. Callers wrap this in their tier-specific error.
#[derive(Error, Debug)]
pub enum FetchFailure {
    /// URL could not be parsed or uses an unsupported scheme.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection, timeout or body read failure.
    #[error("{0}")]
    Transport(String),

    /// Server answered with a non-2xx status.
    #[error("status {}", .0.as_u16())]
    Status(StatusCode),

    /// Body exceeded the configured limit.
    #[error("response too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },
}

/// A successfully fetched response.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Final URL after redirects.
    pub url: Url,
    /// Response body.
    pub body: Vec<u8>,
}

impl Fetched {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Build the HTTP client shared by all acquirers.
///
/// Deadlines are set per request, so the client itself only carries the
/// connect timeout, redirect policy and user agent.
pub fn build_client(settings: &ScanSettings) -> Result<Client> {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
        .user_agent(settings.user_agent.as_str())
        .build()
        .map_err(|e| BlogwatchError::Http(format!("failed to create HTTP client: {}", e)))
}

/// Parse a URL and check that it is http or https.
pub fn validate_url(url: &str) -> std::result::Result<Url, FetchFailure> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchFailure::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(FetchFailure::InvalidUrl(format!(
            "unsupported URL scheme: {}",
            scheme
        ))),
    }
}

/// GET `url` within `timeout`, failing on non-2xx or bodies over `max_bytes`.
pub async fn fetch(
    client: &Client,
    url: &str,
    timeout: Duration,
    max_bytes: u64,
) -> std::result::Result<Fetched, FetchFailure> {
    let target = validate_url(url)?;

    let response = client
        .get(target)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchFailure::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchFailure::Status(status));
    }

    if let Some(content_length) = response.content_length() {
        if content_length > max_bytes {
            return Err(FetchFailure::TooLarge {
                size: content_length,
                max: max_bytes,
            });
        }
    }

    let final_url = response.url().clone();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchFailure::Transport(e.to_string()))?;

    if bytes.len() as u64 > max_bytes {
        return Err(FetchFailure::TooLarge {
            size: bytes.len() as u64,
            max: max_bytes,
        });
    }

    Ok(Fetched {
        url: final_url,
        body: bytes.to_vec(),
    })
}

/// Resolve a possibly relative `href` against `base`.
///
/// Blank or unparsable references yield `None`.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}
