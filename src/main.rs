//! Headliner daemon - keeps per-subscriber news caches warm
//!
//! Wires the cache store, upstream client, aggregator and refresh scheduler
//! together and runs until interrupted. Subscriber records come from a JSON
//! seed file; real deployments swap in a directory backed by their
//! subscriber store.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};

use headliner::aggregator::NewsAggregator;
use headliner::cache::TtlCache;
use headliner::cli::Cli;
use headliner::config::Config;
use headliner::data::{NewsClient, SubscriberPreferences};
use headliner::directory::{MemoryDirectory, SubscriberDirectory};
use headliner::refresh::{self, RefreshConfig, RefreshHandle};

/// Loads the subscriber directory from an optional JSON seed file
fn load_directory(path: Option<&Path>) -> Result<MemoryDirectory, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let subscribers: Vec<SubscriberPreferences> = serde_json::from_str(&content)?;
            info!("seeded directory with {} subscribers from {}", subscribers.len(), path.display());
            Ok(MemoryDirectory::from_subscribers(subscribers))
        }
        None => {
            warn!("no --subscribers file given; starting with an empty directory");
            Ok(MemoryDirectory::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let directory: Arc<dyn SubscriberDirectory> =
        Arc::new(load_directory(cli.subscribers.as_deref())?);
    let cache = Arc::new(TtlCache::new());
    let client = Arc::new(NewsClient::new(&config)?);
    let aggregator = Arc::new(NewsAggregator::new(
        cache,
        client,
        Arc::clone(&directory),
        &config,
    ));

    if cli.once {
        refresh::sweep(&aggregator, directory.as_ref()).await;
        return Ok(());
    }

    let period = Duration::from_secs(cli.refresh_secs.unwrap_or(config.refresh_secs));
    let handle = RefreshHandle::spawn(
        aggregator,
        directory,
        RefreshConfig {
            period,
            enabled: true,
        },
    );
    info!("refresh scheduler running every {period:?}; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    handle.shutdown().await;

    Ok(())
}
