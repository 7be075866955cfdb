use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::errors::{StrataError, StrataResult};

use super::{LayerId, Metadata};

/// One ranked context fragment after fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedItem {
    pub content: String,
    /// Post-fusion score in [0, 1].
    pub score: f64,
    pub source_layer: LayerId,
    pub estimated_tokens: usize,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Summary of one fusion pass.
///
/// `final_items <= deduplicated_items <= total_items` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionStats {
    /// Items from every successful layer.
    pub total_items: usize,
    /// Items dropped for scoring below `min_score`.
    pub filtered_items: usize,
    /// Items left after score filtering and deduplication.
    pub deduplicated_items: usize,
    pub duplicates_removed: usize,
    /// Items that fit in the token budget.
    pub final_items: usize,
    pub estimated_tokens: usize,
    pub layers_fused: usize,
    pub fusion_time: Duration,
}

/// Output of one fusion pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub items: Vec<FusedItem>,
    pub stats: FusionStats,
}

/// Fusion tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionOptions {
    pub max_tokens: usize,
    pub min_score: f64,
    pub diversity_weight: f64,
    pub deduplication_threshold: f64,
}

impl Default for FusionOptions {
    fn default() -> Self {
        Self {
            max_tokens: defaults::DEFAULT_MAX_TOKENS,
            min_score: defaults::DEFAULT_MIN_SCORE,
            diversity_weight: defaults::DEFAULT_DIVERSITY_WEIGHT,
            deduplication_threshold: defaults::DEFAULT_DEDUPLICATION_THRESHOLD,
        }
    }
}

impl FusionOptions {
    /// Reject malformed options. This is the only failure fusion reports.
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

pub(crate) fn validate_unit(field: &str, value: f64) -> StrataResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(StrataError::invalid_input(format!(
            "{field} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(FusionOptions::default().validate().is_ok());
    }

    #[test]
    fn negative_diversity_weight_is_rejected() {
        let opts = FusionOptions {
            diversity_weight: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(StrataError::InvalidInput { .. })
        ));
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let opts = FusionOptions {
            deduplication_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }
}
