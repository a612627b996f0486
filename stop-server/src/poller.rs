//! Scheduled polling of a single stop.
//!
//! A [`StopPoller`] fetches its stop on a fixed interval, keeps the last good
//! snapshot in the shared [`SnapshotCache`] and records how the last poll
//! went. Fetches for the same stop never overlap.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::SnapshotCache;
use crate::domain::{ScanInterval, StopId, StopSnapshot};
use crate::error::ErrorChain;
use crate::upstream::{ApiError, StopSource};

/// A poll that did not produce a snapshot.
#[derive(Debug, thiserror::Error)]
#[error("error fetching stop {stop_id}")]
pub struct UpdateFailed {
    pub stop_id: StopId,
    #[source]
    pub source: ApiError,
}

/// Result of a refresh that did not fail.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// A new snapshot was fetched and cached.
    Updated(Arc<StopSnapshot>),
    /// Another fetch for this stop was already running.
    Skipped,
}

/// Bookkeeping about recent polls of a stop.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStatus {
    /// Stop name from the last successful fetch.
    pub stop_name: Option<String>,
    pub last_update_success: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

/// Polls one stop.
pub struct StopPoller<S> {
    source: Arc<S>,
    stop_id: StopId,
    interval: ScanInterval,
    cache: SnapshotCache,
    in_flight: Mutex<()>,
    status: RwLock<PollStatus>,
}

impl<S> StopPoller<S> {
    pub fn stop_id(&self) -> &StopId {
        &self.stop_id
    }

    pub fn interval(&self) -> ScanInterval {
        self.interval
    }
}

impl<S: StopSource> StopPoller<S> {
    pub fn new(
        source: Arc<S>,
        stop_id: StopId,
        interval: ScanInterval,
        cache: SnapshotCache,
    ) -> Self {
        Self {
            source,
            stop_id,
            interval,
            cache,
            in_flight: Mutex::new(()),
            status: RwLock::new(PollStatus::default()),
        }
    }

    /// Fetch now unless a fetch for this stop is already in flight.
    pub async fn refresh(&self) -> Result<RefreshOutcome, UpdateFailed> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!(stop = %self.stop_id, "Refresh already in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        self.fetch_and_record().await.map(RefreshOutcome::Updated)
    }

    /// Initial fetch at setup; waits out any fetch already in flight.
    pub async fn first_refresh(&self) -> Result<Arc<StopSnapshot>, UpdateFailed> {
        let _guard = self.in_flight.lock().await;
        self.fetch_and_record().await
    }

    /// Must be called with the in-flight guard held.
    async fn fetch_and_record(&self) -> Result<Arc<StopSnapshot>, UpdateFailed> {
        match self.source.fetch_stop(self.stop_id.as_str()).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.cache
                    .insert(self.stop_id.clone(), Arc::clone(&snapshot))
                    .await;

                let stop_name = if snapshot.description.is_empty() {
                    self.stop_id.fallback_name()
                } else {
                    snapshot.description.clone()
                };

                let mut status = self.status.write().await;
                if status.consecutive_failures > 0 {
                    info!(
                        stop = %self.stop_id,
                        failures = status.consecutive_failures,
                        "Stop data recovered"
                    );
                }
                status.stop_name = Some(stop_name);
                status.last_update_success = true;
                status.last_success_at = Some(Utc::now());
                status.last_error = None;
                status.consecutive_failures = 0;

                Ok(snapshot)
            }
            Err(source) => {
                warn!(
                    stop = %self.stop_id,
                    kind = %source.kind(),
                    error = %ErrorChain(&source),
                    "Failed to fetch stop data"
                );

                let mut status = self.status.write().await;
                status.last_update_success = false;
                status.last_error = Some(ErrorChain(&source).to_string());
                status.consecutive_failures = status.consecutive_failures.saturating_add(1);

                Err(UpdateFailed {
                    stop_id: self.stop_id.clone(),
                    source,
                })
            }
        }
    }

    /// Last good snapshot, if it has not expired from the cache.
    pub async fn snapshot(&self) -> Option<Arc<StopSnapshot>> {
        self.cache.get(&self.stop_id).await
    }

    pub async fn status(&self) -> PollStatus {
        self.status.read().await.clone()
    }

    /// Start polling in the background.
    ///
    /// The first poll happens one interval from now; call
    /// [`StopPoller::first_refresh`] beforehand for immediate data.
    pub fn spawn(self: &Arc<Self>) -> PollerHandle {
        let poller = Arc::clone(self);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let period = poller.interval.as_duration();
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Failures are logged and recorded in the status.
                        let _ = poller.refresh().await;
                    }
                    _ = &mut shutdown_rx => break,
                }
            }

            debug!(stop = %poller.stop_id, "Poller stopped");
        });

        PollerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running poll loop.
///
/// Dropping the handle also stops the loop.
pub struct PollerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling and wait for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!(error = %e, "Poller task ended abnormally");
        }
    }
}
