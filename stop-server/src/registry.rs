//! Configured stops and their running pollers.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::SnapshotCache;
use crate::domain::{ScanInterval, StopId};
use crate::error::ErrorChain;
use crate::poller::{PollerHandle, StopPoller, UpdateFailed};
use crate::sensors::{LineSensor, SensorState, line_sensors};
use crate::setup::{SetupError, SetupInput, ValidatedStop, validate_stop};
use crate::upstream::StopSource;

/// Errors from adding a stop.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Validation passed but the first poll failed.
    #[error("stop not ready")]
    NotReady(#[from] UpdateFailed),
}

/// A configured stop.
pub struct StopEntry<S> {
    pub stop_id: StopId,
    pub title: String,
    pub poller: Arc<StopPoller<S>>,

    /// Fixed at setup from the first snapshot.
    pub sensors: Vec<LineSensor>,
}

// Derived Debug would require `S: Debug`.
impl<S> fmt::Debug for StopEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopEntry")
            .field("stop_id", &self.stop_id)
            .field("title", &self.title)
            .field("interval", &self.poller.interval())
            .field("sensors", &self.sensors.len())
            .finish_non_exhaustive()
    }
}

impl<S: StopSource> StopEntry<S> {
    pub fn scan_interval(&self) -> ScanInterval {
        self.poller.interval()
    }

    /// Current state of every sensor.
    pub async fn sensor_states(&self) -> Vec<SensorState> {
        let snapshot = self.poller.snapshot().await;
        let status = self.poller.status().await;

        self.sensors
            .iter()
            .map(|sensor| sensor.state(snapshot.as_deref(), status.last_update_success))
            .collect()
    }
}

struct Registered<S> {
    entry: Arc<StopEntry<S>>,
    handle: PollerHandle,
}

/// All configured stops, keyed by id.
pub struct StopRegistry<S> {
    source: Arc<S>,
    cache: SnapshotCache,
    stops: RwLock<BTreeMap<StopId, Registered<S>>>,
}

impl<S: StopSource> StopRegistry<S> {
    pub fn new(source: Arc<S>, cache: SnapshotCache) -> Self {
        Self {
            source,
            cache,
            stops: RwLock::new(BTreeMap::new()),
        }
    }

    /// Validate a stop and set it up.
    pub async fn configure(&self, input: &SetupInput) -> Result<Arc<StopEntry<S>>, RegistryError> {
        let configured: HashSet<StopId> = self.stops.read().await.keys().cloned().collect();
        let validated =
            validate_stop(self.source.as_ref(), input, |id| configured.contains(id)).await?;
        self.setup(validated).await
    }

    /// Configure several stops concurrently, skipping failures.
    ///
    /// Returns the stops that were set up.
    pub async fn configure_all(&self, inputs: &[SetupInput]) -> Vec<Arc<StopEntry<S>>> {
        let results = join_all(inputs.iter().map(|input| self.configure(input))).await;

        results
            .into_iter()
            .zip(inputs)
            .filter_map(|(result, input)| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(stop = %input.stop_id, error = %ErrorChain(&e), "Skipping stop");
                    None
                }
            })
            .collect()
    }

    /// Start polling a validated stop.
    ///
    /// The first poll runs before the entry is registered; if it fails the
    /// stop is not added.
    pub async fn setup(&self, stop: ValidatedStop) -> Result<Arc<StopEntry<S>>, RegistryError> {
        let poller = Arc::new(StopPoller::new(
            Arc::clone(&self.source),
            stop.stop_id.clone(),
            stop.scan_interval,
            self.cache.clone(),
        ));

        let snapshot = poller.first_refresh().await?;
        let sensors = line_sensors(&stop.stop_id, &snapshot);

        let mut stops = self.stops.write().await;
        if stops.contains_key(&stop.stop_id) {
            return Err(SetupError::AlreadyConfigured(stop.stop_id).into());
        }

        let handle = poller.spawn();
        let entry = Arc::new(StopEntry {
            stop_id: stop.stop_id.clone(),
            title: stop.title,
            poller,
            sensors,
        });

        info!(
            stop = %entry.stop_id,
            title = %entry.title,
            sensors = entry.sensors.len(),
            interval = entry.scan_interval().secs(),
            "Set up stop"
        );

        stops.insert(
            stop.stop_id,
            Registered {
                entry: Arc::clone(&entry),
                handle,
            },
        );

        Ok(entry)
    }

    /// Stop polling a stop and drop its data. Returns false if unknown.
    pub async fn unload(&self, stop_id: &StopId) -> bool {
        let removed = self.stops.write().await.remove(stop_id);
        let Some(registered) = removed else {
            return false;
        };

        registered.handle.shutdown().await;
        self.cache.invalidate(stop_id).await;
        info!(stop = %stop_id, "Unloaded stop");
        true
    }

    pub async fn get(&self, stop_id: &StopId) -> Option<Arc<StopEntry<S>>> {
        self.stops
            .read()
            .await
            .get(stop_id)
            .map(|registered| Arc::clone(&registered.entry))
    }

    /// Configured stops, ordered by id.
    pub async fn list(&self) -> Vec<Arc<StopEntry<S>>> {
        self.stops
            .read()
            .await
            .values()
            .map(|registered| Arc::clone(&registered.entry))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.stops.read().await.len()
    }

    /// Stop every poller.
    pub async fn shutdown(&self) {
        let stops = std::mem::take(&mut *self.stops.write().await);
        let count = stops.len();

        join_all(stops.into_values().map(|registered| registered.handle.shutdown())).await;
        info!(stops = count, "Stopped all pollers");
    }
}
