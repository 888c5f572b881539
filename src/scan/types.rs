//! Scan outcome types.

use std::fmt;

use serde::Serialize;

/// Which acquisition tier produced a source's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanTier {
    Feed,
    Scraper,
    None,
}

impl ScanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanTier::Feed => "feed",
            ScanTier::Scraper => "scraper",
            ScanTier::None => "none",
        }
    }
}

impl fmt::Display for ScanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scanning one source.
///
/// One is produced for every source scanned, whether or not anything failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub source_name: String,
    /// Items inserted by this scan.
    pub new_items: usize,
    /// Distinct item URLs found, before the storage check.
    pub total_found: usize,
    pub tier: ScanTier,
    /// Recorded failures, if any. Never aborts the scan.
    pub error: Option<String>,
}

impl ScanResult {
    /// An empty result for `source_name`.
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            new_items: 0,
            total_found: 0,
            tier: ScanTier::None,
            error: None,
        }
    }

    /// Check if any error was recorded.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} new / {} found via {}",
            self.source_name, self.new_items, self.total_found, self.tier
        )?;
        if let Some(error) = &self.error {
            write!(f, " (error: {})", error)?;
        }
        Ok(())
    }
}

/// Totals over the results of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub sources: usize,
    pub new_items: usize,
    /// Sources whose result recorded an error.
    pub failed: usize,
}

impl ScanSummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.sources += 1;
            summary.new_items += result.new_items;
            if result.is_error() {
                summary.failed += 1;
            }
            summary
        })
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} source(s), {} new item(s), {} with errors",
            self.sources, self.new_items, self.failed
        )
    }
}
