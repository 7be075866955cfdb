use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::MultiHopOptions;

use super::defaults;

/// Multi-hop router configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiHopConfig {
    pub max_concurrent_hops: usize,
    pub hop_timeout_ms: u64,
    /// Hand completed dependency context to dependent hops for relevance scoring.
    pub pass_dependency_context: bool,
}

impl Default for MultiHopConfig {
    fn default() -> Self {
        Self {
            max_concurrent_hops: defaults::DEFAULT_MAX_CONCURRENT_HOPS,
            hop_timeout_ms: defaults::DEFAULT_HOP_TIMEOUT_MS,
            pass_dependency_context: defaults::DEFAULT_PASS_DEPENDENCY_CONTEXT,
        }
    }
}

impl MultiHopConfig {
    pub fn options(&self) -> MultiHopOptions {
        MultiHopOptions {
            max_concurrent_hops: self.max_concurrent_hops,
            hop_timeout: Duration::from_millis(self.hop_timeout_ms),
        }
    }
}
