//! Command-line interface.

use clap::Parser;

/// Scan tracked blogs for new posts.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Number of parallel workers (overrides the configuration)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Scan only the source with this name
    #[arg(short, long)]
    pub source: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}
