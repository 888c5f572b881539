//! Error types for blogwatch.

use thiserror::Error;

/// Common error type for blogwatch.
#[derive(Error, Debug)]
pub enum BlogwatchError {
    /// Feed could not be fetched (transport failure, non-2xx status, oversized body).
    #[error("failed to fetch feed: {0}")]
    FeedFetch(String),

    /// Feed was fetched but its content could not be parsed.
    #[error("failed to parse feed: {0}")]
    FeedParse(String),

    /// Page to scrape could not be fetched.
    #[error("failed to fetch page: {0}")]
    ScrapeFetch(String),

    /// Page was fetched but could not be scraped (bad URL or selector).
    #[error("failed to parse page: {0}")]
    ScrapeParse(String),

    /// Database error.
    ///
    /// Errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// A database handle could not be opened.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction error.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A scan worker task panicked or was aborted.
    #[error("scan worker failed: {0}")]
    Worker(String),
}

impl From<sqlx::Error> for BlogwatchError {
    fn from(e: sqlx::Error) -> Self {
        BlogwatchError::Database(e.to_string())
    }
}

/// Result type alias for blogwatch operations.
pub type Result<T> = std::result::Result<T, BlogwatchError>;
