//! Golden dataset tests: rule-only classification and decomposition.

use std::sync::Arc;

use serde_json::Value;
use strata_core::config::defaults;
use strata_core::models::{DecompositionOptions, ExecutionStrategy, LayerId, QueryType};
use strata_retrieval::classify::{ClassifierChain, RoutingTable, RuleClassifier};
use strata_retrieval::decompose::{decompose_with_rules, graph};
use test_fixtures::load_fixture_value;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rule_chain() -> ClassifierChain {
    ClassifierChain::new(defaults::DEFAULT_FALLBACK_LAYER_WEIGHT).with(Box::new(RuleClassifier::new(
        Arc::new(RoutingTable::default()),
        0.6,
    )))
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v.as_str().expect("string").to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn golden_classification() {
    let fixture = load_fixture_value("golden/classification.json");
    let chain = rule_chain();
    let cancel = CancellationToken::new();

    for case in fixture["cases"].as_array().expect("cases") {
        let query = case["query"].as_str().unwrap();
        let expected: QueryType = serde_json::from_value(case["expected_type"].clone()).unwrap();
        let result = chain.classify(query, &cancel).await;

        assert_eq!(result.query_type, expected, "type for {query:?}");
        assert!(
            result.confidence >= case["min_confidence"].as_f64().unwrap(),
            "confidence {} for {query:?}",
            result.confidence
        );
        for layer in strings(&case["expected_layers"]) {
            let layer: LayerId = layer.parse().unwrap();
            assert!(result.layers.contains(&layer), "{layer} missing for {query:?}");
        }
        assert!(result.weights.keys().all(|l| result.layers.contains(l)));
    }
}

// ---------------------------------------------------------------------------
// Decomposition
// ---------------------------------------------------------------------------

#[test]
fn golden_decomposition() {
    let fixture = load_fixture_value("golden/decomposition.json");

    for case in fixture["cases"].as_array().expect("cases") {
        let query = case["query"].as_str().unwrap();
        let d = decompose_with_rules(query, &DecompositionOptions::default()).unwrap();

        assert_eq!(d.is_complex, case["is_complex"].as_bool().unwrap(), "{query:?}");
        let texts: Vec<String> = d.sub_queries.iter().map(|sq| sq.text.clone()).collect();
        assert_eq!(texts, strings(&case["sub_queries"]), "{query:?}");

        let deps: Vec<Vec<String>> = case["dependencies"]
            .as_array()
            .unwrap()
            .iter()
            .map(strings)
            .collect();
        let actual: Vec<Vec<String>> = d.sub_queries.iter().map(|sq| sq.dependencies.clone()).collect();
        assert_eq!(actual, deps, "{query:?}");

        let strategy: ExecutionStrategy = serde_json::from_value(case["strategy"].clone()).unwrap();
        assert_eq!(d.strategy, strategy, "{query:?}");

        let waves: Vec<Vec<usize>> = serde_json::from_value(case["waves"].clone()).unwrap();
        assert_eq!(graph::plan_waves(&d).unwrap(), waves, "{query:?}");
    }
}
