//! Fusion: budget enforcement, idempotence, cross-layer behaviour.

use std::sync::Arc;
use std::time::Duration;

use strata_core::models::{FusionOptions, LayerId, LayerItem, LayerResult};
use strata_retrieval::fusion::FusionEngine;
use strata_tokens::HeuristicEstimator;

fn engine() -> FusionEngine {
    FusionEngine::new(Arc::new(HeuristicEstimator::default()))
}

/// 400 characters of words unique to item `i`.
fn distinct_content(i: usize) -> String {
    let mut s = String::new();
    let mut j = 0;
    while s.len() < 400 {
        s.push_str(&format!("item{i}word{j} "));
        j += 1;
    }
    s.truncate(400);
    s
}

fn layer(id: LayerId, weight: f64, items: Vec<LayerItem>) -> LayerResult {
    LayerResult::success(id, items, Duration::ZERO, weight)
}

#[test]
fn fifty_hundred_token_items_fit_ten_into_a_thousand() {
    let items: Vec<LayerItem> = (0..50)
        .map(|i| LayerItem::new(distinct_content(i), 1.0 - i as f64 * 0.01))
        .collect();
    let options = FusionOptions {
        max_tokens: 1000,
        min_score: 0.0,
        diversity_weight: 0.0,
        deduplication_threshold: 0.85,
    };

    let fused = engine()
        .fuse(&[layer(LayerId::Vector, 1.0, items)], &options)
        .unwrap();

    assert_eq!(fused.items.len(), 10);
    assert_eq!(fused.stats.total_items, 50);
    assert_eq!(fused.stats.deduplicated_items, 50);
    assert_eq!(fused.stats.final_items, 10);
    assert_eq!(fused.stats.estimated_tokens, 1000);
    assert!(fused.items.iter().all(|i| i.estimated_tokens == 100));
    // Highest scores survive.
    assert_eq!(fused.items[0].content, distinct_content(0));
}

#[test]
fn fusing_fused_output_is_identity() {
    let results = vec![
        layer(
            LayerId::Session,
            0.6,
            vec![
                LayerItem::new("edited the token refresh handler", 0.9),
                LayerItem::new("ran the auth integration suite", 0.4),
            ],
        ),
        layer(
            LayerId::Project,
            0.4,
            vec![
                LayerItem::new("auth depends on the session store", 12.0),
                LayerItem::new("session store imports redis client", 3.0),
            ],
        ),
    ];
    let options = FusionOptions {
        min_score: 0.0,
        ..Default::default()
    };
    let engine = engine();

    let once = engine.fuse(&results, &options).unwrap();
    let twice = engine.refuse(&once.items, &options).unwrap();

    assert_eq!(once.items, twice.items);
    assert_eq!(twice.stats.duplicates_removed, 0);
}

#[test]
fn near_duplicates_across_layers_collapse_to_best() {
    let results = vec![
        layer(
            LayerId::Vector,
            1.0,
            vec![LayerItem::new("jwt tokens are signed with the server key", 0.9)],
        ),
        layer(
            LayerId::General,
            0.5,
            vec![LayerItem::new("JWT tokens are signed with the server key.", 0.9)],
        ),
    ];
    let options = FusionOptions {
        min_score: 0.0,
        diversity_weight: 0.0,
        ..Default::default()
    };
    let fused = engine().fuse(&results, &options).unwrap();
    assert_eq!(fused.items.len(), 1);
    assert_eq!(fused.items[0].source_layer, LayerId::Vector);
    assert_eq!(fused.stats.duplicates_removed, 1);
}

#[test]
fn min_score_filters_before_the_budget() {
    let results = vec![layer(
        LayerId::Vector,
        0.5,
        vec![
            LayerItem::new("strong match", 1.0),
            LayerItem::new("weak match", 0.1),
        ],
    )];
    let options = FusionOptions {
        min_score: 0.3,
        diversity_weight: 0.0,
        ..Default::default()
    };
    let fused = engine().fuse(&results, &options).unwrap();
    assert_eq!(fused.items.len(), 1);
    assert_eq!(fused.stats.filtered_items, 1);
    assert!(fused.stats.final_items <= fused.stats.deduplicated_items);
    assert!(fused.stats.deduplicated_items <= fused.stats.total_items);
}

#[test]
fn budget_stops_at_first_overflow() {
    let results = vec![layer(
        LayerId::Vector,
        1.0,
        vec![
            LayerItem::new("a".repeat(40), 0.9),
            LayerItem::new("b".repeat(400), 0.8),
            LayerItem::new("c".repeat(4), 0.7),
        ],
    )];
    let options = FusionOptions {
        max_tokens: 20,
        min_score: 0.0,
        diversity_weight: 0.0,
        ..Default::default()
    };
    let fused = engine().fuse(&results, &options).unwrap();
    // The 100-token item overflows; the small one after it is not considered.
    assert_eq!(fused.items.len(), 1);
    assert_eq!(fused.items[0].estimated_tokens, 10);
}
