use clap::Parser;
use tracing::{error, info, warn};

use blogwatch::cli::Cli;
use blogwatch::{Config, Database, ScanResult, ScanSummary, Scanner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config);
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = blogwatch::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        blogwatch::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(2);
    }

    if let Err(e) = run(&cli, &config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, config: &Config) -> blogwatch::Result<()> {
    let db = Database::open(&config.database.path).await?;
    let scanner = Scanner::new(&config.scan.settings())?;
    let workers = cli.workers.unwrap_or(config.scan.workers);

    let results = match &cli.source {
        Some(name) => match scanner.scan_by_name(&db, name).await? {
            Some(result) => vec![result],
            None => {
                warn!("No source named {:?}", name);
                db.close().await;
                return Err(blogwatch::BlogwatchError::NotFound(format!("source {:?}", name)));
            }
        },
        None => scanner.scan_all_sources(&db, workers).await?,
    };

    print_results(&results, cli.json)?;

    info!("Scan finished: {}", ScanSummary::from_results(&results));

    db.close().await;
    Ok(())
}

fn print_results(results: &[ScanResult], json: bool) -> blogwatch::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(results)
            .map_err(|e| blogwatch::BlogwatchError::Validation(e.to_string()))?;
        println!("{out}");
    } else {
        for result in results {
            println!("{result}");
        }
    }
    Ok(())
}
