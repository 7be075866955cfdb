//! Fusion engine: turns per-layer results into one ranked, deduplicated,
//! token-bounded context list.
//!
//! Pipeline: normalize per layer → weight → diversity → min-score filter →
//! dedup → sort → greedy token budget. Pure apart from timing; errors only on
//! malformed input.

pub mod deduplication;
pub mod normalize;
pub mod rank;

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use strata_core::errors::{StrataError, StrataResult};
use strata_core::models::{FusedItem, FusedResult, FusionOptions, FusionStats, LayerResult, Metadata};
use strata_core::traits::TokenEstimator;
use strata_observability::fusion_span;
use tracing::debug;

use normalize::normalize_scores;
use rank::{rank, Candidate, RankOptions};

/// Fusion bound to a token estimator.
#[derive(Clone)]
pub struct FusionEngine {
    estimator: Arc<dyn TokenEstimator>,
}

impl FusionEngine {
    pub fn new(estimator: Arc<dyn TokenEstimator>) -> Self {
        Self { estimator }
    }

    pub fn estimator(&self) -> &dyn TokenEstimator {
        self.estimator.as_ref()
    }

    pub fn fuse(
        &self,
        layer_results: &[LayerResult],
        options: &FusionOptions,
    ) -> StrataResult<FusedResult> {
        fuse(layer_results, options, self.estimator.as_ref())
    }

    /// Re-run fusion over already-fused items.
    ///
    /// Scores are post-fusion already, so they are neither renormalized nor given
    /// another diversity bonus. Fusing a fusion result returns it unchanged.
    pub fn refuse(&self, items: &[FusedItem], options: &FusionOptions) -> StrataResult<FusedResult> {
        options.validate()?;
        let start = Instant::now();
        if let Some(bad) = items.iter().find(|i| !i.score.is_finite()) {
            return Err(StrataError::invalid_input(format!(
                "non-finite score {} in fused item",
                bad.score
            )));
        }

        let candidates = items
            .iter()
            .enumerate()
            .map(|(order, item)| Candidate {
                content: item.content.clone(),
                base_score: item.score,
                group: item.source_layer.as_str().to_string(),
                source_layer: item.source_layer,
                metadata: item.metadata.clone(),
                order,
            })
            .collect();
        let layers_fused = items
            .iter()
            .map(|i| i.source_layer)
            .collect::<std::collections::BTreeSet<_>>()
            .len();

        let opts = RankOptions {
            max_tokens: options.max_tokens,
            min_score: options.min_score,
            diversity_weight: 0.0,
            deduplication_threshold: options.deduplication_threshold,
            max_results: None,
        };
        let ranked = rank(candidates, &opts, self.estimator.as_ref());
        Ok(into_result(ranked, layers_fused, start))
    }
}

/// Fuse successful layer results. Failed layers are skipped.
pub fn fuse(
    layer_results: &[LayerResult],
    options: &FusionOptions,
    estimator: &dyn TokenEstimator,
) -> StrataResult<FusedResult> {
    options.validate()?;
    let span = fusion_span!(layer_results.len(), options.max_tokens);
    let _guard = span.enter();
    let start = Instant::now();

    let mut candidates = Vec::new();
    let mut layers_fused = 0;
    let mut order = 0;

    for layer in layer_results.iter().filter(|l| l.is_success()) {
        if !layer.weight.is_finite() || layer.weight < 0.0 {
            return Err(StrataError::invalid_input(format!(
                "layer {} has invalid weight {}",
                layer.layer, layer.weight
            )));
        }
        if let Some(bad) = layer.items.iter().find(|i| !i.score.is_finite()) {
            return Err(StrataError::invalid_input(format!(
                "layer {} returned non-finite score {}",
                layer.layer, bad.score
            )));
        }

        layers_fused += 1;
        let raw: Vec<f64> = layer.items.iter().map(|i| i.score).collect();
        let normalized = normalize_scores(&raw);

        for (item, norm) in layer.items.iter().zip(normalized) {
            let mut metadata: Metadata = item.metadata.clone();
            metadata.insert("raw_score".to_string(), json!(item.score));
            metadata.insert("normalized_score".to_string(), json!(norm));
            metadata.insert("layer_weight".to_string(), json!(layer.weight));

            candidates.push(Candidate {
                content: item.content.clone(),
                base_score: norm * layer.weight,
                group: layer.layer.as_str().to_string(),
                source_layer: layer.layer,
                metadata,
                order,
            });
            order += 1;
        }
    }

    let opts = RankOptions {
        max_tokens: options.max_tokens,
        min_score: options.min_score,
        diversity_weight: options.diversity_weight,
        deduplication_threshold: options.deduplication_threshold,
        max_results: None,
    };
    let ranked = rank(candidates, &opts, estimator);
    let result = into_result(ranked, layers_fused, start);

    debug!(
        total = result.stats.total_items,
        deduplicated = result.stats.deduplicated_items,
        final_items = result.stats.final_items,
        tokens = result.stats.estimated_tokens,
        "fusion complete"
    );

    Ok(result)
}

fn into_result(ranked: rank::Ranked, layers_fused: usize, start: Instant) -> FusedResult {
    let stats = FusionStats {
        total_items: ranked.total,
        filtered_items: ranked.filtered,
        deduplicated_items: ranked.deduplicated,
        duplicates_removed: ranked.duplicates_removed,
        final_items: ranked.items.len(),
        estimated_tokens: ranked.estimated_tokens,
        layers_fused,
        fusion_time: start.elapsed(),
    };
    FusedResult {
        items: ranked.items,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use strata_core::errors::LayerError;
    use strata_core::models::{LayerId, LayerItem};
    use strata_tokens::HeuristicEstimator;

    fn layer(id: LayerId, weight: f64, items: &[(&str, f64)]) -> LayerResult {
        LayerResult::success(
            id,
            items
                .iter()
                .map(|(c, s)| LayerItem::new(*c, *s))
                .collect(),
            Duration::ZERO,
            weight,
        )
    }

    #[test]
    fn failed_layers_are_excluded() {
        let results = vec![
            layer(LayerId::Session, 0.6, &[("session note about auth", 0.9)]),
            LayerResult::failure(
                LayerId::Project,
                LayerError::Timeout {
                    layer: LayerId::Project,
                    after_ms: 10,
                },
                Duration::ZERO,
                0.4,
            ),
        ];
        let fused = fuse(&results, &FusionOptions::default(), &HeuristicEstimator::default())
            .unwrap();
        assert_eq!(fused.stats.layers_fused, 1);
        assert_eq!(fused.items.len(), 1);
        assert_eq!(fused.items[0].source_layer, LayerId::Session);
    }

    #[test]
    fn provenance_metadata_is_recorded() {
        let results = vec![layer(LayerId::Vector, 1.0, &[("jwt is a token format", 0.7)])];
        let fused = fuse(&results, &FusionOptions::default(), &HeuristicEstimator::default())
            .unwrap();
        let meta = &fused.items[0].metadata;
        assert_eq!(meta["raw_score"], json!(0.7));
        assert_eq!(meta["layer_weight"], json!(1.0));
        assert!(fused.items[0].score <= 1.0);
    }

    #[test]
    fn non_finite_scores_are_invalid_input() {
        let results = vec![layer(LayerId::Vector, 1.0, &[("x", f64::NAN)])];
        let err = fuse(&results, &FusionOptions::default(), &HeuristicEstimator::default())
            .unwrap_err();
        assert!(matches!(err, StrataError::InvalidInput { .. }));
    }

    #[test]
    fn out_of_range_min_score_is_invalid_input() {
        let opts = FusionOptions {
            min_score: 1.5,
            ..Default::default()
        };
        assert!(fuse(&[], &opts, &HeuristicEstimator::default()).is_err());
    }

    #[test]
    fn empty_input_fuses_to_empty() {
        let fused = fuse(&[], &FusionOptions::default(), &HeuristicEstimator::default()).unwrap();
        assert!(fused.items.is_empty());
        assert_eq!(fused.stats.total_items, 0);
    }
}
