//! The ranking pipeline shared by fusion and cross-hop combination:
//! diversity re-weighting → min-score filter → sort → dedup → token budget.

use std::collections::HashMap;

use strata_core::models::{FusedItem, LayerId, Metadata};
use strata_core::traits::TokenEstimator;
use strata_tokens::prefix_within;

use super::deduplication::deduplicate;

/// A pooled item waiting to be ranked.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub content: String,
    /// Pre-diversity score, already normalized and weighted.
    pub base_score: f64,
    /// Diversity bucket: the source layer for fusion, the hop for combination.
    pub group: String,
    pub source_layer: LayerId,
    pub metadata: Metadata,
    /// Position in the input, used to break score ties.
    pub order: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct RankOptions {
    pub max_tokens: usize,
    pub min_score: f64,
    pub diversity_weight: f64,
    pub deduplication_threshold: f64,
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Ranked {
    pub items: Vec<FusedItem>,
    pub total: usize,
    /// Dropped by the min-score filter.
    pub filtered: usize,
    /// Survivors of deduplication.
    pub deduplicated: usize,
    pub duplicates_removed: usize,
    pub estimated_tokens: usize,
}

/// Run the ranking pipeline over `candidates`.
///
/// Candidates are visited in descending `base_score` order. Each accepted candidate
/// earns `diversity_weight × (1 − share)` on top of its base score, where `share` is
/// the fraction of already-accepted items from the same group. Final scores are
/// clamped to [0, 1]; items that saturate are ordered by their unclamped score.
pub fn rank(
    mut candidates: Vec<Candidate>,
    options: &RankOptions,
    estimator: &dyn TokenEstimator,
) -> Ranked {
    let total = candidates.len();

    candidates.sort_by(|a, b| {
        b.base_score
            .total_cmp(&a.base_score)
            .then(a.order.cmp(&b.order))
    });

    // Step 1: diversity re-weighting and the min-score filter.
    let mut accepted_by_group: HashMap<String, usize> = HashMap::new();
    let mut accepted_total = 0usize;
    let mut filtered = 0usize;
    // (candidate, clamped score, unclamped score)
    let mut scored: Vec<(Candidate, f64, f64)> = Vec::with_capacity(total);

    for candidate in candidates {
        let share = if accepted_total == 0 {
            0.0
        } else {
            accepted_by_group
                .get(&candidate.group)
                .copied()
                .unwrap_or(0) as f64
                / accepted_total as f64
        };
        let raw = candidate.base_score + options.diversity_weight * (1.0 - share);
        let score = raw.clamp(0.0, 1.0);
        if score < options.min_score {
            filtered += 1;
            continue;
        }
        *accepted_by_group.entry(candidate.group.clone()).or_default() += 1;
        accepted_total += 1;
        scored.push((candidate, score, raw));
    }

    // Step 2: final order. Ties fall back to the unclamped score, then input order.
    scored.sort_by(|(a, sa, ra), (b, sb, rb)| {
        sb.total_cmp(sa)
            .then(rb.total_cmp(ra))
            .then(a.order.cmp(&b.order))
    });

    // Step 3: near-duplicate removal, best-first.
    let (kept, duplicates_removed) = deduplicate(
        scored,
        |(c, _, _)| c.content.as_str(),
        options.deduplication_threshold,
    );
    let deduplicated = kept.len();

    // Step 4: greedy token budget, stopping at the first overflow.
    let costs: Vec<usize> = kept
        .iter()
        .map(|(c, _, _)| estimator.estimate(&c.content))
        .collect();
    let mut take = prefix_within(&costs, options.max_tokens);
    if let Some(max) = options.max_results {
        take = take.min(max);
    }

    let items: Vec<FusedItem> = kept
        .into_iter()
        .zip(costs)
        .take(take)
        .map(|((c, score, _), tokens)| FusedItem {
            content: c.content,
            score,
            source_layer: c.source_layer,
            estimated_tokens: tokens,
            metadata: c.metadata,
        })
        .collect();
    let estimated_tokens = items.iter().map(|i| i.estimated_tokens).sum();

    Ranked {
        items,
        total,
        filtered,
        deduplicated,
        duplicates_removed,
        estimated_tokens,
    }
}
