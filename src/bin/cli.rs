//! Places Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use places_crawler::{
    browser::chrome::ChromeSession,
    error::Result,
    models::Config,
    pipeline,
    services::Resolution,
    storage::LocalStorage,
};

/// Places - map listing crawler
#[derive(Parser, Debug)]
#[command(
    name = "places-crawler",
    version,
    about = "Extracts business listings and reviews from map search"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every query and write the places file
    Crawl {
        /// Query to crawl; replaces the configured list (repeatable)
        #[arg(short, long = "query")]
        queries: Vec<String>,

        /// Output file (default: output.path from config)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Resolve a single query to its listing URL
    Resolve {
        /// Free-text query
        query: String,
    },

    /// Validate configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Close the browser once no task holds it anymore.
async fn shutdown(session: Arc<ChromeSession>) {
    match Arc::try_unwrap(session) {
        Ok(session) => {
            if let Err(e) = session.shutdown().await {
                log::warn!("Browser shutdown failed: {}", e);
            }
        }
        Err(_) => log::warn!("Browser still in use, skipping shutdown"),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Crawl { queries, output } => {
            if !queries.is_empty() {
                config.queries = queries;
            }
            if let Some(path) = output {
                config.output.path = path;
            }

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            let config = Arc::new(config);
            let storage = LocalStorage::from_config(&config.output);
            let session = Arc::new(ChromeSession::start(&config.browser).await?);

            let result =
                pipeline::run_crawler(Arc::clone(&config), session.clone(), &storage).await;
            shutdown(session).await;
            result?;

            log::info!("Done!");
        }

        Command::Resolve { query } => {
            config.queries = vec![query.clone()];
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            let session = Arc::new(ChromeSession::start(&config.browser).await?);
            let resolution = pipeline::resolve_query(&config, session.as_ref(), &query).await;
            shutdown(session).await;

            match resolution? {
                Resolution::Resolved { url } => println!("{url}"),
                Resolution::NotFound { iterations } => {
                    log::warn!("'{}' not found after {} iterations", query, iterations)
                }
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} queries)", config.queries.len());
        }
    }

    Ok(())
}
