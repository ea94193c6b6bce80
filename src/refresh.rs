//! Background cache refresh system
//!
//! Re-primes every known subscriber's cache entry on a fixed period,
//! independent of incoming requests, so article reads stay warm between
//! TTL expiries.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::aggregator::NewsAggregator;
use crate::directory::SubscriberDirectory;

/// Configuration for the refresh scheduler
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between cache sweeps
    pub period: Duration,
    /// Whether background refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(300), // 5 minutes
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh task
///
/// Exactly one periodic task runs per handle. A sweep executes inside the
/// task loop, so the next tick cannot start while the previous sweep is
/// still running.
pub struct RefreshHandle {
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Spawns the periodic sweep task
    ///
    /// # Arguments
    /// * `aggregator` - Shared aggregator whose miss path re-primes entries
    /// * `directory` - Source of the subscriber list for each sweep
    /// * `config` - Sweep period and enablement
    ///
    /// # Returns
    /// A handle whose [`shutdown`](RefreshHandle::shutdown) stops the task
    pub fn spawn(
        aggregator: Arc<NewsAggregator>,
        directory: Arc<dyn SubscriberDirectory>,
        config: RefreshConfig,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = if config.enabled {
            Some(tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately; skip it so startup
                // traffic and the sweep do not double-fetch the same entries.
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            sweep(&aggregator, directory.as_ref()).await;
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            }))
        } else {
            None
        };

        Self { shutdown_tx, task }
    }

    /// Stops future ticks and waits for any in-flight sweep to drain
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Runs one refresh sweep over every subscriber in the directory
///
/// Per-subscriber refreshes run concurrently. A failing subscriber is logged
/// and does not stop the sweep; its prior cache entry stays untouched.
pub async fn sweep(aggregator: &NewsAggregator, directory: &dyn SubscriberDirectory) {
    let subscribers = directory.list_all_preferences().await;
    let total = subscribers.len();

    let outcomes = join_all(subscribers.into_iter().map(|subscriber| async move {
        let outcome = aggregator
            .fetch_and_cache(&subscriber.subscriber_id, &subscriber.preferences)
            .await;
        (subscriber.subscriber_id, outcome)
    }))
    .await;

    let mut refreshed = 0usize;
    for (subscriber_id, outcome) in outcomes {
        match outcome {
            Ok(articles) => {
                refreshed += 1;
                debug!(
                    "refreshed {} cached articles for subscriber '{subscriber_id}'",
                    articles.len()
                );
            }
            Err(err) => warn!("refresh for subscriber '{subscriber_id}' failed: {err}"),
        }
    }

    info!("cache sweep refreshed {refreshed}/{total} subscribers");
}
