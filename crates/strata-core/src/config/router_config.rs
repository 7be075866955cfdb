use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Memory router configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Independent timeout applied to each layer query.
    pub layer_timeout_ms: u64,
    pub max_results_per_layer: usize,
    pub cache_enabled: bool,
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            layer_timeout_ms: defaults::DEFAULT_LAYER_TIMEOUT_MS,
            max_results_per_layer: defaults::DEFAULT_MAX_RESULTS_PER_LAYER,
            cache_enabled: defaults::DEFAULT_ROUTING_CACHE_ENABLED,
            cache_capacity: defaults::DEFAULT_ROUTING_CACHE_CAPACITY,
            cache_ttl_secs: defaults::DEFAULT_ROUTING_CACHE_TTL_SECS,
        }
    }
}

impl RouterConfig {
    pub fn layer_timeout(&self) -> Duration {
        Duration::from_millis(self.layer_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
