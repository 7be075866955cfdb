//! Routing result cache.
//!
//! Uses `moka::sync::Cache` bounded by entry count with a fixed time-to-live.
//! Keyed by (normalized query, query type). Tracks hits/misses/rate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use strata_core::config::RouterConfig;
use strata_core::models::{RoutingCacheKey, RoutingResult};
use strata_core::traits::RoutingCache;

/// Bounded TTL cache with hit/miss tracking.
pub struct MokaRoutingCache {
    cache: Cache<RoutingCacheKey, Arc<RoutingResult>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MokaRoutingCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.cache_capacity, config.cache_ttl())
    }

    /// Total cache hits.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total cache misses.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Cache hit rate (0.0–1.0).
    pub fn hit_rate(&self) -> f64 {
        let h = self.hits() as f64;
        let m = self.misses() as f64;
        let total = h + m;
        if total == 0.0 {
            0.0
        } else {
            h / total
        }
    }
}

impl RoutingCache for MokaRoutingCache {
    fn get(&self, key: &RoutingCacheKey) -> Option<RoutingResult> {
        match self.cache.get(key) {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(RoutingResult::clone(&v))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert_if_absent(&self, key: RoutingCacheKey, value: RoutingResult) -> bool {
        self.cache
            .entry(key)
            .or_insert_with(|| Arc::new(value))
            .is_fresh()
    }

    fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    fn len(&self) -> u64 {
        // entry_count lags behind writes until pending maintenance runs.
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}
