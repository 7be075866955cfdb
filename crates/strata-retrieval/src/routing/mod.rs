//! Memory router: concurrent fan-out to the layers a classification selected.
//!
//! One task per layer inside a `JoinSet`, each with its own timeout and error
//! boundary. A failing layer becomes an error `LayerResult`; the others carry on.
//! Every selected layer has exactly one result in the output, in `LayerId` order.

pub mod cache;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use strata_core::config::RouterConfig;
use strata_core::errors::LayerError;
use strata_core::models::{
    ClassificationResult, LayerId, LayerResult, RoutingCacheKey, RoutingResult, RoutingStats,
};
use strata_core::traits::{LayerQueryOptions, MemoryLayer, RoutingCache};
use strata_observability::routing_span;
use strata_observability::tracing_setup::events;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

pub use cache::MokaRoutingCache;

pub struct MemoryRouter {
    layers: HashMap<LayerId, Arc<dyn MemoryLayer>>,
    cache: Option<Arc<dyn RoutingCache>>,
    layer_timeout: Duration,
    max_results_per_layer: usize,
}

impl MemoryRouter {
    /// A router with no layers and no cache.
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            layers: HashMap::new(),
            cache: None,
            layer_timeout: config.layer_timeout(),
            max_results_per_layer: config.max_results_per_layer,
        }
    }

    /// Register a layer under its own id, replacing any previous registration.
    pub fn with_layer(mut self, layer: Arc<dyn MemoryLayer>) -> Self {
        self.layers.insert(layer.id(), layer);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn RoutingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<dyn RoutingCache>> {
        self.cache.as_ref()
    }

    pub fn registered_layers(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = self.layers.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Query every layer in `classification.layers` and collect one result each.
    ///
    /// Never fails: layer failures, timeouts and cancellation are recorded in the
    /// returned `LayerResult`s and stats.
    pub async fn route(
        &self,
        query: &str,
        classification: &ClassificationResult,
        cancel: &CancellationToken,
    ) -> RoutingResult {
        let span = routing_span!(query, classification.query_type);
        self.route_inner(query, classification, cancel)
            .instrument(span)
            .await
    }

    async fn route_inner(
        &self,
        query: &str,
        classification: &ClassificationResult,
        cancel: &CancellationToken,
    ) -> RoutingResult {
        let start = Instant::now();
        let key = RoutingCacheKey::new(query, classification.query_type);

        if let Some(cache) = &self.cache {
            if let Some(mut hit) = cache.get(&key) {
                events::cache_hit(&key.normalized_query, classification.query_type.as_str());
                hit.query = query.to_string();
                hit.classification = classification.clone();
                hit.stats.cache_hit = true;
                hit.stats.total_time = start.elapsed();
                return hit;
            }
        }

        let mut results: BTreeMap<LayerId, LayerResult> = BTreeMap::new();
        let mut join_set = JoinSet::new();

        for layer_id in classification.layers.iter().copied() {
            let weight = classification.weight_for(layer_id);
            let Some(layer) = self.layers.get(&layer_id).cloned() else {
                let error = LayerError::NotRegistered { layer: layer_id };
                events::layer_failed(layer_id.as_str(), &error.to_string(), 0);
                results.insert(
                    layer_id,
                    LayerResult::failure(layer_id, error, Duration::ZERO, weight),
                );
                continue;
            };
            let opts = LayerQueryOptions {
                limit: self.max_results_per_layer,
                timeout: self.layer_timeout,
                cancel: cancel.child_token(),
            };
            let text = query.to_string();
            join_set.spawn(query_layer(layer, layer_id, text, opts, weight).in_current_span());
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => {
                    results.insert(result.layer, result);
                }
                Err(e) => warn!(error = %e, "layer task did not complete"),
            }
        }

        // A task that panicked left no result behind; record it so every selected
        // layer is accounted for.
        for layer_id in classification.layers.iter().copied() {
            results.entry(layer_id).or_insert_with(|| {
                LayerResult::failure(
                    layer_id,
                    LayerError::Aborted {
                        layer: layer_id,
                        reason: "layer task aborted".to_string(),
                    },
                    start.elapsed(),
                    classification.weight_for(layer_id),
                )
            });
        }

        let layers: Vec<LayerResult> = results.into_values().collect();
        let layers_failed = layers.iter().filter(|l| !l.is_success()).count();
        let stats = RoutingStats {
            total_time: start.elapsed(),
            layers_queried: classification.layers.len(),
            layers_failed,
            cache_hit: false,
            cancelled: cancel.is_cancelled(),
        };

        let result = RoutingResult {
            query: query.to_string(),
            classification: classification.clone(),
            layers,
            stats,
        };

        if result.all_failed() {
            events::all_layers_failed(query, result.layers.len());
        }

        debug!(
            layers = result.stats.layers_queried,
            failed = result.stats.layers_failed,
            items = result.item_count(),
            elapsed_ms = result.stats.total_time.as_millis() as u64,
            "routing complete"
        );

        if let Some(cache) = &self.cache {
            if result.stats.layers_failed == 0 && !result.stats.cancelled {
                cache.insert_if_absent(key, result.clone());
            }
        }

        result
    }
}

/// Query one layer under its timeout and cancellation token.
async fn query_layer(
    layer: Arc<dyn MemoryLayer>,
    layer_id: LayerId,
    text: String,
    opts: LayerQueryOptions,
    weight: f64,
) -> LayerResult {
    let started = Instant::now();
    let timeout = opts.timeout;
    let limit = opts.limit;
    let cancel = opts.cancel.clone();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LayerError::Cancelled { layer: layer_id }),
        res = tokio::time::timeout(timeout, layer.query(&text, &opts)) => match res {
            Ok(Ok(mut items)) => {
                items.truncate(limit);
                Ok(items)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(LayerError::Timeout {
                layer: layer_id,
                after_ms: timeout.as_millis() as u64,
            }),
        },
    };

    let elapsed = started.elapsed();
    match outcome {
        Ok(items) => LayerResult::success(layer_id, items, elapsed, weight),
        Err(error) => {
            events::layer_failed(
                layer_id.as_str(),
                &error.to_string(),
                elapsed.as_millis() as u64,
            );
            LayerResult::failure(layer_id, error, elapsed, weight)
        }
    }
}
