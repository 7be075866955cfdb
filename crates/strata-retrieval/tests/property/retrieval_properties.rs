use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use strata_core::models::{DecompositionOptions, FusionOptions, LayerId, LayerItem, LayerResult};
use strata_retrieval::classify::rules;
use strata_retrieval::decompose::{decompose_with_rules, graph};
use strata_retrieval::fusion::normalize::normalize_scores;
use strata_retrieval::fusion::FusionEngine;
use strata_retrieval::text::{jaccard, token_set};
use strata_tokens::HeuristicEstimator;

const VOCAB: &[&str] = &[
    "auth", "jwt", "session", "token", "refresh", "redis", "store", "module", "tests", "docs",
    "billing", "invoice", "parser", "cache", "router", "layer",
];

const CLAUSES: &[&str] = &[
    "implement auth",
    "write tests for it",
    "update the docs",
    "fix the login bug",
    "refactor the billing module",
    "what is JWT?",
    "how does refresh work?",
    "create the schema",
    "migrate the data",
    "deploy the service",
];

const JOINERS: &[&str] = &[", ", " and ", ", and ", " then ", "; ", " "];

fn content() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), 1..6).prop_map(|w| w.join(" "))
}

fn layer_result() -> impl Strategy<Value = LayerResult> {
    (
        prop::sample::select(LayerId::ALL.to_vec()),
        0.0f64..=1.0,
        prop::collection::vec((content(), -5.0f64..20.0), 0..12),
    )
        .prop_map(|(id, weight, items)| {
            LayerResult::success(
                id,
                items
                    .into_iter()
                    .map(|(c, s)| LayerItem::new(c, s))
                    .collect(),
                Duration::ZERO,
                weight,
            )
        })
}

fn fusion_options() -> impl Strategy<Value = FusionOptions> {
    (1usize..200, 0.0f64..=1.0, 0.0f64..0.5, 0.1f64..=1.0).prop_map(
        |(max_tokens, min_score, diversity_weight, deduplication_threshold)| FusionOptions {
            max_tokens,
            min_score,
            diversity_weight,
            deduplication_threshold,
        },
    )
}

fn compound_query() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (prop::sample::select(CLAUSES), prop::sample::select(JOINERS)),
        1..7,
    )
    .prop_map(|parts| {
        let mut q = String::new();
        for (i, (clause, joiner)) in parts.iter().enumerate() {
            if i > 0 {
                q.push_str(joiner);
            }
            q.push_str(clause);
        }
        q
    })
}

fn engine() -> FusionEngine {
    FusionEngine::new(Arc::new(HeuristicEstimator::default()))
}

proptest! {
    #[test]
    fn fusion_counts_and_budget_hold(
        layers in prop::collection::vec(layer_result(), 0..6),
        options in fusion_options(),
    ) {
        let fused = engine().fuse(&layers, &options).unwrap();
        let s = &fused.stats;
        prop_assert!(s.final_items <= s.deduplicated_items);
        prop_assert!(s.deduplicated_items <= s.total_items);
        prop_assert!(s.estimated_tokens <= options.max_tokens);
        prop_assert_eq!(s.final_items, fused.items.len());
        for item in &fused.items {
            prop_assert!((0.0..=1.0).contains(&item.score));
            prop_assert!(item.score >= options.min_score);
        }
    }

    #[test]
    fn fused_items_are_pairwise_distinct(
        layers in prop::collection::vec(layer_result(), 1..6),
        options in fusion_options(),
    ) {
        let fused = engine().fuse(&layers, &options).unwrap();
        for (i, a) in fused.items.iter().enumerate() {
            for b in &fused.items[i + 1..] {
                let sim = jaccard(&token_set(&a.content), &token_set(&b.content));
                prop_assert!(sim < options.deduplication_threshold);
            }
        }
    }

    #[test]
    fn fusion_is_idempotent_on_its_output(
        layers in prop::collection::vec(layer_result(), 1..6),
        options in fusion_options(),
    ) {
        let engine = engine();
        let once = engine.fuse(&layers, &options).unwrap();
        let twice = engine.refuse(&once.items, &options).unwrap();
        prop_assert_eq!(once.items, twice.items);
    }

    #[test]
    fn normalized_scores_stay_in_unit_range(scores in prop::collection::vec(-1e6f64..1e6, 0..30)) {
        let normalized = normalize_scores(&scores);
        prop_assert_eq!(normalized.len(), scores.len());
        prop_assert!(normalized.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn rule_confidence_is_a_probability(query in ".{0,120}") {
        let m = rules::evaluate(&query);
        prop_assert!((0.0..=1.0).contains(&m.confidence));
        if m.best.is_none() {
            prop_assert_eq!(m.confidence, 0.0);
        }
    }

    #[test]
    fn decomposition_is_a_bounded_dag(query in compound_query(), max in 1usize..6) {
        let options = DecompositionOptions { max_sub_queries: max, min_complexity_indicators: 2 };
        let d = decompose_with_rules(&query, &options).unwrap();
        prop_assert!(!d.sub_queries.is_empty());
        prop_assert!(d.sub_queries.len() <= max);
        prop_assert!(graph::validate(&d.sub_queries).is_ok());
        if !d.is_complex {
            prop_assert_eq!(d.sub_queries.len(), 1);
            prop_assert!(d.sub_queries[0].dependencies.is_empty());
        }
        let waves = graph::plan_waves(&d).unwrap();
        let planned: usize = waves.iter().map(Vec::len).sum();
        prop_assert_eq!(planned, d.sub_queries.len());
    }
}
