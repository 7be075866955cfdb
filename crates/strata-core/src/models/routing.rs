use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::LayerError;

use super::{ClassificationResult, LayerId, LayerItem, QueryType};

/// One layer's response within a routing call. Holds items or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerResult {
    pub layer: LayerId,
    pub items: Vec<LayerItem>,
    pub elapsed: Duration,
    pub weight: f64,
    pub error: Option<LayerError>,
}

impl LayerResult {
    pub fn success(layer: LayerId, items: Vec<LayerItem>, elapsed: Duration, weight: f64) -> Self {
        Self {
            layer,
            items,
            elapsed,
            weight,
            error: None,
        }
    }

    pub fn failure(layer: LayerId, error: LayerError, elapsed: Duration, weight: f64) -> Self {
        Self {
            layer,
            items: Vec::new(),
            elapsed,
            weight,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Timing and caching summary of one routing call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingStats {
    /// Wall-clock time of the whole fan-out, not the sum of layer times.
    pub total_time: Duration,
    /// Number of layers selected by the classification, failed ones included.
    pub layers_queried: usize,
    pub layers_failed: usize,
    pub cache_hit: bool,
    pub cancelled: bool,
}

/// Outcome of one routing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub query: String,
    pub classification: ClassificationResult,
    pub layers: Vec<LayerResult>,
    pub stats: RoutingStats,
}

impl RoutingResult {
    pub fn successful_layers(&self) -> impl Iterator<Item = &LayerResult> {
        self.layers.iter().filter(|l| l.is_success())
    }

    /// True when every selected layer failed. The result is still a valid, empty one.
    pub fn all_failed(&self) -> bool {
        !self.layers.is_empty() && self.layers.iter().all(|l| !l.is_success())
    }

    pub fn item_count(&self) -> usize {
        self.layers.iter().map(|l| l.items.len()).sum()
    }
}

/// Routing cache key: normalized query text plus the classified type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingCacheKey {
    pub normalized_query: String,
    pub query_type: QueryType,
}

impl RoutingCacheKey {
    pub fn new(query: &str, query_type: QueryType) -> Self {
        Self {
            normalized_query: normalize_query(query),
            query_type,
        }
    }
}

/// Lowercase, trim, collapse whitespace, and strip trailing `?`, `!`, `.`.
pub fn normalize_query(query: &str) -> String {
    let collapsed = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_end_matches(|c: char| matches!(c, '?' | '!' | '.'))
        .trim_end()
        .to_string()
}
