use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::errors::{LayerError, StrataError, StrataResult};

use super::fusion::validate_unit;
use super::{ClassificationResult, DecompositionResult, FusedItem};

/// Outcome of executing one sub-query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopResult {
    pub sub_query_id: String,
    pub sub_query_text: String,
    pub classification: ClassificationResult,
    pub context: Vec<FusedItem>,
    /// Alignment of the context with the sub-query's intent. Independent of fusion scores.
    pub relevance_score: f64,
    pub execution_time: Duration,
    pub wave: usize,
    /// Offset from the start of the multi-hop run when the hop began.
    pub started_at: Duration,
    /// Offset from the start of the multi-hop run when the hop finished.
    pub completed_at: Duration,
    /// Layers selected by the hop's classification, failed ones included.
    pub layers_queried: usize,
    /// Every layer failure from the hop's routing call.
    pub layer_errors: Vec<LayerError>,
    /// The hop was cut short by cancellation. Its context, if any, is partial.
    pub cancelled: bool,
    /// Set when the hop produced no usable layer output: it timed out, was never
    /// started, or every selected layer failed.
    pub error: Option<String>,
}

impl HopResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn layers_failed(&self) -> usize {
        self.layer_errors.len()
    }

    /// Succeeded, but some layers failed or cancellation cut it short.
    pub fn is_degraded(&self) -> bool {
        self.is_success() && (self.cancelled || !self.layer_errors.is_empty())
    }
}

/// Aggregate statistics for a multi-hop run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiHopStats {
    pub total_hops: usize,
    pub failed_hops: usize,
    /// Hops cut short by cancellation, failed or not.
    pub cancelled_hops: usize,
    /// Layer failures summed over every hop.
    pub layers_failed: usize,
    pub waves: usize,
    pub total_time: Duration,
    pub decomposition_time: Duration,
    pub execution_time: Duration,
    pub combination_time: Duration,
    pub average_results_per_hop: f64,
    pub cross_hop_dedup_rate: f64,
    pub estimated_tokens: usize,
}

/// Final multi-hop outcome. `hops` has one entry per sub-query, failed hops included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiHopResult {
    pub decomposition: DecompositionResult,
    pub hops: Vec<HopResult>,
    pub combined_context: Vec<FusedItem>,
    pub rendered_context: Option<String>,
    pub stats: MultiHopStats,
}

/// Multi-hop execution limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiHopOptions {
    pub max_concurrent_hops: usize,
    pub hop_timeout: Duration,
}

impl Default for MultiHopOptions {
    fn default() -> Self {
        Self {
            max_concurrent_hops: defaults::DEFAULT_MAX_CONCURRENT_HOPS,
            hop_timeout: Duration::from_millis(defaults::DEFAULT_HOP_TIMEOUT_MS),
        }
    }
}

impl MultiHopOptions {
    pub fn validate(&self) -> StrataResult<()> {
        if self.max_concurrent_hops == 0 {
            return Err(StrataError::invalid_input(
                "max_concurrent_hops must be at least 1",
            ));
        }
        if self.hop_timeout.is_zero() {
            return Err(StrataError::invalid_input("hop_timeout must be non-zero"));
        }
        Ok(())
    }
}

/// Result combiner tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineOptions {
    pub max_results: usize,
    pub include_separators: bool,
    pub max_tokens: usize,
    pub min_score: f64,
    pub diversity_weight: f64,
    pub deduplication_threshold: f64,
    pub tag_provenance: bool,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            max_results: defaults::DEFAULT_COMBINE_MAX_RESULTS,
            include_separators: false,
            max_tokens: defaults::DEFAULT_MAX_TOKENS,
            min_score: defaults::DEFAULT_MIN_SCORE,
            diversity_weight: defaults::DEFAULT_DIVERSITY_WEIGHT,
            deduplication_threshold: defaults::DEFAULT_DEDUPLICATION_THRESHOLD,
            tag_provenance: true,
        }
    }
}

impl CombineOptions {
    pub fn validate(&self) -> StrataResult<()> {
        validate_unit("min_score", self.min_score)?;
        validate_unit("deduplication_threshold", self.deduplication_threshold)?;
        if !self.diversity_weight.is_finite() || self.diversity_weight < 0.0 {
            return Err(StrataError::invalid_input(format!(
                "diversity_weight must be a non-negative finite number, got {}",
                self.diversity_weight
            )));
        }
        Ok(())
    }
}

/// Summary of one combination pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombineStats {
    pub total_items: usize,
    pub duplicates_removed: usize,
    pub final_items: usize,
    pub estimated_tokens: usize,
    pub cross_hop_dedup_rate: f64,
    pub combination_time: Duration,
}

/// Combiner output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedContext {
    pub items: Vec<FusedItem>,
    pub rendered: Option<String>,
    pub stats: CombineStats,
}
