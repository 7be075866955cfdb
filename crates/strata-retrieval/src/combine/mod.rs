//! Result combiner: pools every hop's context into one ranked, deduplicated,
//! budgeted list with hop provenance.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use strata_core::errors::{StrataError, StrataResult};
use strata_core::models::{CombineOptions, CombineStats, CombinedContext, HopResult};
use strata_core::traits::TokenEstimator;
use strata_observability::combination_span;
use tracing::debug;

use crate::fusion::rank::{rank, Candidate, RankOptions};

const HOP_ID_KEY: &str = "hop_id";
const HOP_QUERY_KEY: &str = "hop_query";

#[derive(Clone)]
pub struct ResultCombiner {
    estimator: Arc<dyn TokenEstimator>,
}

impl ResultCombiner {
    pub fn new(estimator: Arc<dyn TokenEstimator>) -> Self {
        Self { estimator }
    }

    /// Merge hop contexts.
    ///
    /// A pooled item's base score is `score × (0.5 + 0.5 × hop relevance)`. Diversity
    /// is bucketed per hop. Failed hops contribute nothing but still get a heading in
    /// the rendered context.
    pub fn combine(
        &self,
        hops: &[HopResult],
        options: &CombineOptions,
    ) -> StrataResult<CombinedContext> {
        options.validate()?;
        let span = combination_span!(hops.len());
        let _guard = span.enter();
        let start = Instant::now();

        let mut candidates = Vec::new();
        for hop in hops {
            if !hop.relevance_score.is_finite() {
                return Err(StrataError::invalid_input(format!(
                    "hop {} has non-finite relevance {}",
                    hop.sub_query_id, hop.relevance_score
                )));
            }
            let relevance = hop.relevance_score.clamp(0.0, 1.0);
            for item in &hop.context {
                if !item.score.is_finite() {
                    return Err(StrataError::invalid_input(format!(
                        "hop {} carries non-finite score {}",
                        hop.sub_query_id, item.score
                    )));
                }
                let mut metadata = item.metadata.clone();
                metadata.insert(HOP_ID_KEY.to_string(), json!(hop.sub_query_id));
                if options.tag_provenance {
                    metadata.insert(HOP_QUERY_KEY.to_string(), json!(hop.sub_query_text));
                }
                let order = candidates.len();
                candidates.push(Candidate {
                    content: item.content.clone(),
                    base_score: item.score * (0.5 + 0.5 * relevance),
                    group: hop.sub_query_id.clone(),
                    source_layer: item.source_layer,
                    metadata,
                    order,
                });
            }
        }

        let opts = RankOptions {
            max_tokens: options.max_tokens,
            min_score: options.min_score,
            diversity_weight: options.diversity_weight,
            deduplication_threshold: options.deduplication_threshold,
            max_results: Some(options.max_results),
        };
        let ranked = rank(candidates, &opts, self.estimator.as_ref());

        let rendered = options
            .include_separators
            .then(|| render(hops, &ranked.items));

        let mut items = ranked.items;
        if !options.tag_provenance {
            for item in &mut items {
                item.metadata.remove(HOP_ID_KEY);
            }
        }

        let stats = CombineStats {
            total_items: ranked.total,
            duplicates_removed: ranked.duplicates_removed,
            final_items: items.len(),
            estimated_tokens: ranked.estimated_tokens,
            cross_hop_dedup_rate: if ranked.total == 0 {
                0.0
            } else {
                ranked.duplicates_removed as f64 / ranked.total as f64
            },
            combination_time: start.elapsed(),
        };

        debug!(
            hops = hops.len(),
            total = stats.total_items,
            final_items = stats.final_items,
            dedup_rate = stats.cross_hop_dedup_rate,
            "combination complete"
        );

        Ok(CombinedContext {
            items,
            rendered,
            stats,
        })
    }
}

/// One `### <sub-query>` section per hop, in hop order, holding that hop's
/// surviving items in rank order.
fn render(hops: &[HopResult], items: &[strata_core::models::FusedItem]) -> String {
    let mut out = String::new();
    for hop in hops {
        out.push_str("### ");
        out.push_str(&hop.sub_query_text);
        out.push('\n');
        let mut any = false;
        for item in items
            .iter()
            .filter(|i| i.metadata.get(HOP_ID_KEY) == Some(&json!(hop.sub_query_id)))
        {
            out.push_str(&item.content);
            out.push_str("\n\n");
            any = true;
        }
        if !any {
            out.push_str("(no additional context)\n\n");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use strata_core::models::{ClassificationResult, FusedItem, LayerId, Metadata};
    use strata_tokens::HeuristicEstimator;

    fn hop(id: &str, text: &str, relevance: f64, items: &[(&str, f64)]) -> HopResult {
        HopResult {
            sub_query_id: id.to_string(),
            sub_query_text: text.to_string(),
            classification: ClassificationResult::fallback(text, 0.5, "test"),
            context: items
                .iter()
                .map(|(c, s)| FusedItem {
                    content: c.to_string(),
                    score: *s,
                    source_layer: LayerId::Project,
                    estimated_tokens: 1,
                    metadata: Metadata::new(),
                })
                .collect(),
            relevance_score: relevance,
            execution_time: Duration::ZERO,
            wave: 0,
            started_at: Duration::ZERO,
            completed_at: Duration::ZERO,
            layers_queried: 1,
            layer_errors: Vec::new(),
            cancelled: false,
            error: None,
        }
    }

    fn combiner() -> ResultCombiner {
        ResultCombiner::new(Arc::new(HeuristicEstimator::default()))
    }

    fn options() -> CombineOptions {
        CombineOptions {
            min_score: 0.0,
            diversity_weight: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn cross_hop_duplicates_collapse() {
        let hops = vec![
            hop("sq-0", "implement auth", 1.0, &[("auth middleware checks the jwt", 0.9)]),
            hop("sq-1", "write tests", 1.0, &[("auth middleware checks the jwt", 0.7)]),
        ];
        let combined = combiner().combine(&hops, &options()).unwrap();
        assert_eq!(combined.items.len(), 1);
        assert_eq!(combined.stats.duplicates_removed, 1);
        assert!((combined.stats.cross_hop_dedup_rate - 0.5).abs() < 1e-9);
        assert_eq!(combined.items[0].metadata[HOP_ID_KEY], json!("sq-0"));
        assert_eq!(combined.items[0].metadata[HOP_QUERY_KEY], json!("implement auth"));
    }

    #[test]
    fn relevance_scales_base_score() {
        let hops = vec![
            hop("sq-0", "a", 0.0, &[("low relevance hop item", 0.8)]),
            hop("sq-1", "b", 1.0, &[("high relevance hop item", 0.6)]),
        ];
        let combined = combiner().combine(&hops, &options()).unwrap();
        assert_eq!(combined.items[0].content, "high relevance hop item");
        assert!((combined.items[0].score - 0.6).abs() < 1e-9);
        assert!((combined.items[1].score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn rendered_context_has_one_heading_per_hop() {
        let mut failed = hop("sq-1", "update the docs", 0.0, &[]);
        failed.error = Some("timed out".to_string());
        let hops = vec![hop("sq-0", "implement auth", 1.0, &[("auth lives in src/auth", 0.9)]), failed];
        let opts = CombineOptions {
            include_separators: true,
            ..options()
        };
        let rendered = combiner().combine(&hops, &opts).unwrap().rendered.unwrap();
        assert_eq!(
            rendered,
            "### implement auth\nauth lives in src/auth\n\n### update the docs\n(no additional context)\n\n"
        );
    }

    #[test]
    fn untagged_items_carry_no_hop_metadata() {
        let hops = vec![hop("sq-0", "a", 1.0, &[("some context", 0.5)])];
        let opts = CombineOptions {
            tag_provenance: false,
            ..options()
        };
        let combined = combiner().combine(&hops, &opts).unwrap();
        assert!(combined.items[0].metadata.is_empty());
    }

    #[test]
    fn empty_input_has_zero_dedup_rate() {
        let combined = combiner().combine(&[], &options()).unwrap();
        assert!(combined.items.is_empty());
        assert_eq!(combined.stats.cross_hop_dedup_rate, 0.0);
    }
}
