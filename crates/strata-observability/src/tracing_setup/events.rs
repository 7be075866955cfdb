//! Structured log events for recovered failures and notable pipeline moments.
//!
//! Each function emits a `tracing` event with structured fields.

/// A component failed and the pipeline continued with a fallback.
pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %component,
        failure = %failure,
        fallback = %fallback,
        "degradation triggered"
    );
}

/// One memory layer failed within a routing call.
pub fn layer_failed(layer: &str, error: &str, elapsed_ms: u64) {
    tracing::warn!(
        event = "layer_failed",
        layer = %layer,
        error = %error,
        elapsed_ms = elapsed_ms,
        "memory layer failed"
    );
}

/// Every selected layer failed; the routing result is empty.
pub fn all_layers_failed(query: &str, layers: usize) {
    tracing::warn!(
        event = "all_layers_failed",
        query = %query,
        layers = layers,
        "all memory layers failed"
    );
}

/// A routing call was served from cache.
pub fn cache_hit(normalized_query: &str, query_type: &str) {
    tracing::debug!(
        event = "cache_hit",
        query = %normalized_query,
        query_type = %query_type,
        "routing cache hit"
    );
}

/// Decomposition failed and the query runs as a single hop.
pub fn decomposition_fallback(query: &str, reason: &str) {
    tracing::warn!(
        event = "decomposition_fallback",
        query = %query,
        reason = %reason,
        "decomposition fell back to single hop"
    );
}

/// A hop failed or timed out and was recorded with empty context.
pub fn hop_failed(sub_query_id: &str, wave: usize, error: &str) {
    tracing::warn!(
        event = "hop_failed",
        sub_query = %sub_query_id,
        wave = wave,
        error = %error,
        "hop failed"
    );
}

/// A query was cancelled or hit its deadline mid-flight.
pub fn query_cancelled(query: &str, stage: &str) {
    tracing::info!(
        event = "query_cancelled",
        query = %query,
        stage = %stage,
        "query cancelled"
    );
}
