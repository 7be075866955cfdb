//! Multi-hop execution: wave ordering, concurrency limits, hop failures,
//! layer failure reporting, and cancellation mid-run.

use std::sync::Arc;
use std::time::Duration;

use strata_core::config::RouterConfig;
use strata_core::models::{
    CombineOptions, DecompositionOptions, LayerId, MultiHopOptions, QueryType,
};
use strata_retrieval::classify::{ClassifierChain, RoutingTable, RuleClassifier};
use strata_retrieval::combine::ResultCombiner;
use strata_retrieval::decompose::decompose_with_rules;
use strata_retrieval::fusion::FusionEngine;
use strata_retrieval::multi_hop::MultiHopRouter;
use strata_retrieval::pipeline::Pipeline;
use strata_retrieval::routing::MemoryRouter;
use strata_tokens::HeuristicEstimator;
use strata_core::errors::LayerError;
use test_fixtures::fakes::{DelayedLayer, FailingLayer};
use tokio_util::sync::CancellationToken;

const COMPOUND: &str = "Implement auth, write tests for it, and update the docs";

fn pipeline(implement_delay: Duration) -> Arc<Pipeline> {
    let table = Arc::new(RoutingTable::default());
    let classifier =
        ClassifierChain::new(0.5).with(Box::new(RuleClassifier::new(table, 0.6)));
    let layer = |id| {
        Arc::new(
            DelayedLayer::new(id, Duration::from_millis(10))
                .with_delay("implement", implement_delay)
                .with_delay("tests", Duration::from_millis(50))
                .with_delay("docs", Duration::from_millis(80)),
        )
    };
    let router = MemoryRouter::new(&RouterConfig::default())
        .with_layer(layer(LayerId::Session))
        .with_layer(layer(LayerId::Project));
    let estimator = Arc::new(HeuristicEstimator::default());
    Arc::new(Pipeline::new(classifier, router, FusionEngine::new(estimator)))
}

fn pipeline_with(router: MemoryRouter) -> Arc<Pipeline> {
    let table = Arc::new(RoutingTable::default());
    let classifier =
        ClassifierChain::new(0.3).with(Box::new(RuleClassifier::new(table, 0.6)));
    let estimator = Arc::new(HeuristicEstimator::default());
    Arc::new(Pipeline::new(classifier, router, FusionEngine::new(estimator)))
}

fn multi_hop(pipeline: Arc<Pipeline>) -> MultiHopRouter {
    MultiHopRouter::new(
        pipeline,
        ResultCombiner::new(Arc::new(HeuristicEstimator::default())),
    )
    .with_combine_options(CombineOptions {
        include_separators: true,
        ..Default::default()
    })
}

fn options(max_concurrent_hops: usize, hop_timeout: Duration) -> MultiHopOptions {
    MultiHopOptions {
        max_concurrent_hops,
        hop_timeout,
    }
}

#[tokio::test(start_paused = true)]
async fn dependents_start_after_their_dependency_completes() {
    let decomposition = decompose_with_rules(COMPOUND, &DecompositionOptions::default()).unwrap();
    let router = multi_hop(pipeline(Duration::from_millis(200)));

    let result = router
        .run(&decomposition, &options(3, Duration::from_secs(5)), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.hops.len(), 3);
    assert_eq!(result.stats.waves, 2);
    assert_eq!(result.stats.failed_hops, 0);
    let [implement, tests, docs] = [&result.hops[0], &result.hops[1], &result.hops[2]];

    assert_eq!(implement.wave, 0);
    assert_eq!(tests.wave, 1);
    assert_eq!(docs.wave, 1);
    assert!(tests.started_at >= implement.completed_at);
    assert!(docs.started_at >= implement.completed_at);

    // Same wave, under the concurrency limit: they start together and overlap.
    assert_eq!(tests.started_at, docs.started_at);
    assert!(tests.completed_at > docs.started_at);

    assert_eq!(implement.classification.query_type, QueryType::Procedural);
    assert!(implement.relevance_score > 0.0);
    assert!(result.hops.iter().all(|h| !h.context.is_empty()));
    assert!(!result.combined_context.is_empty());
    assert!(result.stats.average_results_per_hop > 0.0);

    let rendered = result.rendered_context.unwrap();
    assert!(rendered.starts_with("### Implement auth\n"));
    assert!(rendered.contains("### write tests for it\n"));
    assert!(rendered.contains("### update the docs\n"));
}

#[tokio::test(start_paused = true)]
async fn concurrency_limit_serializes_a_wave() {
    let decomposition = decompose_with_rules(COMPOUND, &DecompositionOptions::default()).unwrap();
    let router = multi_hop(pipeline(Duration::from_millis(20)));

    let result = router
        .run(&decomposition, &options(1, Duration::from_secs(5)), &CancellationToken::new())
        .await
        .unwrap();

    let (tests, docs) = (&result.hops[1], &result.hops[2]);
    let serialized =
        tests.started_at >= docs.completed_at || docs.started_at >= tests.completed_at;
    assert!(serialized, "hops overlapped with max_concurrent_hops = 1");
}

#[tokio::test(start_paused = true)]
async fn timed_out_hop_is_recorded_and_dependents_still_run() {
    let decomposition = decompose_with_rules(COMPOUND, &DecompositionOptions::default()).unwrap();
    let router = multi_hop(pipeline(Duration::from_secs(30)));

    let result = router
        .run(&decomposition, &options(3, Duration::from_millis(500)), &CancellationToken::new())
        .await
        .unwrap();

    let implement = &result.hops[0];
    assert!(!implement.is_success());
    assert!(implement.error.as_deref().unwrap().contains("timed out"));
    assert!(implement.context.is_empty());
    assert!(implement.classification.is_fallback());
    assert_eq!(implement.relevance_score, 0.0);

    assert!(result.hops[1].is_success());
    assert!(result.hops[2].is_success());
    assert!(result.hops[1].started_at >= implement.completed_at);
    assert_eq!(result.stats.failed_hops, 1);
    assert!(result
        .rendered_context
        .unwrap()
        .contains("### Implement auth\n(no additional context)"));
}

#[tokio::test]
async fn cancelled_run_records_every_hop_as_failed() {
    let decomposition = decompose_with_rules(COMPOUND, &DecompositionOptions::default()).unwrap();
    let router = multi_hop(pipeline(Duration::from_millis(10)));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = router
        .run(&decomposition, &MultiHopOptions::default(), &cancel)
        .await
        .unwrap();

    assert_eq!(result.hops.len(), 3);
    assert_eq!(result.stats.failed_hops, 3);
    assert!(result.combined_context.is_empty());
    assert!(result.hops.iter().all(|h| h.error.as_deref() == Some("cancelled")));
    assert!(result.hops.iter().all(|h| h.cancelled));
    assert_eq!(result.stats.cancelled_hops, 3);
}

#[tokio::test]
async fn hops_whose_layers_all_fail_are_reported_as_failed() {
    let mut router = MemoryRouter::new(&RouterConfig::default());
    for id in LayerId::ALL {
        router = router.with_layer(Arc::new(FailingLayer::new(id)));
    }
    let decomposition = decompose_with_rules(COMPOUND, &DecompositionOptions::default()).unwrap();

    let result = multi_hop(pipeline_with(router))
        .run(&decomposition, &MultiHopOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.stats.failed_hops, 3);
    for hop in &result.hops {
        assert!(!hop.is_success());
        assert!(hop.error.as_deref().unwrap().contains("layers failed"));
        assert!(hop.layers_queried > 0);
        assert_eq!(hop.layers_failed(), hop.layers_queried);
        assert!(hop
            .layer_errors
            .iter()
            .all(|e| matches!(e, LayerError::QueryFailed { .. })));
        assert!(hop.context.is_empty());
    }
    let per_hop: usize = result.hops.iter().map(|h| h.layers_failed()).sum();
    assert_eq!(result.stats.layers_failed, per_hop);
    assert!(result.combined_context.is_empty());
}

#[tokio::test(start_paused = true)]
async fn partial_layer_failure_degrades_a_hop_without_failing_it() {
    let router = MemoryRouter::new(&RouterConfig::default())
        .with_layer(Arc::new(FailingLayer::new(LayerId::Session)))
        .with_layer(Arc::new(DelayedLayer::new(LayerId::Project, Duration::from_millis(10))));
    let decomposition = decompose_with_rules(COMPOUND, &DecompositionOptions::default()).unwrap();

    let result = multi_hop(pipeline_with(router))
        .run(&decomposition, &MultiHopOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    let implement = &result.hops[0];
    assert_eq!(implement.classification.query_type, QueryType::Procedural);
    assert!(implement.is_success());
    assert!(implement.is_degraded());
    assert_eq!(implement.layers_queried, 2);
    assert!(matches!(
        implement.layer_errors.as_slice(),
        [LayerError::QueryFailed { layer: LayerId::Session, .. }]
    ));
    assert!(!implement.context.is_empty());
    assert!(result.stats.layers_failed >= 1);
}

#[tokio::test(start_paused = true)]
async fn cancelling_after_the_first_wave_keeps_its_context() {
    let decomposition = decompose_with_rules(COMPOUND, &DecompositionOptions::default()).unwrap();
    // Wave 0 finishes at 200ms; wave 1 would run until 280ms.
    let router = multi_hop(pipeline(Duration::from_millis(200)));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(230)).await;
        trigger.cancel();
    });

    let result = router
        .run(&decomposition, &options(3, Duration::from_secs(5)), &cancel)
        .await
        .unwrap();

    let [implement, tests, docs] = [&result.hops[0], &result.hops[1], &result.hops[2]];
    assert!(implement.is_success());
    assert!(!implement.cancelled);
    assert!(!implement.context.is_empty());

    for hop in [tests, docs] {
        assert_eq!(hop.wave, 1);
        assert!(hop.cancelled);
        assert!(!hop.is_success());
        assert!(hop.context.is_empty());
        assert!(hop
            .layer_errors
            .iter()
            .any(|e| matches!(e, LayerError::Cancelled { .. })));
    }
    assert_eq!(result.stats.failed_hops, 2);
    assert_eq!(result.stats.cancelled_hops, 2);
    assert!(!result.combined_context.is_empty());
    assert!(result
        .combined_context
        .iter()
        .all(|i| i.metadata["hop_id"] == implement.sub_query_id.as_str()));
}

#[tokio::test]
async fn zero_concurrency_is_invalid_input() {
    let decomposition = decompose_with_rules(COMPOUND, &DecompositionOptions::default()).unwrap();
    let router = multi_hop(pipeline(Duration::from_millis(10)));
    let err = router
        .run(&decomposition, &options(0, Duration::from_secs(1)), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_caller_error());
}
