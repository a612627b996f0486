//! Last-good snapshot cache.
//!
//! Each stop's most recent successful snapshot is kept here for readers
//! between polls. Entries expire after a TTL, so a stop whose upstream keeps
//! failing eventually has no data rather than arbitrarily stale data.
//!
//! The cache is unbounded: it holds one entry per configured stop and the
//! registry invalidates an entry when its stop is unloaded. A size bound
//! would let eviction drop data for stops that are still polling fine.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::{StopId, StopSnapshot};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries. Must exceed the scan interval of every stop.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
        }
    }
}

/// Snapshot cache keyed by stop.
///
/// Cheap to clone; clones share the same storage.
#[derive(Clone)]
pub struct SnapshotCache {
    snapshots: MokaCache<StopId, Arc<StopSnapshot>>,
}

impl SnapshotCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let snapshots = MokaCache::builder().time_to_live(config.ttl).build();

        Self { snapshots }
    }

    /// Latest snapshot for a stop, if one is still fresh.
    pub async fn get(&self, stop_id: &StopId) -> Option<Arc<StopSnapshot>> {
        self.snapshots.get(stop_id).await
    }

    /// Replace the snapshot for a stop.
    pub async fn insert(&self, stop_id: StopId, snapshot: Arc<StopSnapshot>) {
        self.snapshots.insert(stop_id, snapshot).await;
    }

    /// Drop a stop's snapshot.
    pub async fn invalidate(&self, stop_id: &StopId) {
        self.snapshots.invalidate(stop_id).await;
    }
}
