use std::collections::HashMap;

use strata_core::config::*;
use strata_core::errors::ConfigError;

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = StrataConfig::from_toml_str("").unwrap();

    assert_eq!(config.classifier.min_rule_confidence, 0.6);
    assert!(config.classifier.use_inference);
    assert_eq!(config.classifier.fallback_weight, 0.3);

    assert_eq!(config.router.layer_timeout_ms, 2_000);
    assert_eq!(config.router.max_results_per_layer, 20);
    assert!(config.router.cache_enabled);
    assert_eq!(config.router.cache_ttl_secs, 300);

    assert_eq!(config.fusion.max_tokens, 4_000);
    assert_eq!(config.fusion.deduplication_threshold, 0.85);

    assert_eq!(config.decomposition.max_sub_queries, 5);
    assert_eq!(config.decomposition.min_complexity_indicators, 2);

    assert_eq!(config.multi_hop.max_concurrent_hops, 3);
    assert_eq!(config.multi_hop.hop_timeout_ms, 10_000);

    assert!(!config.inference.enabled);
    assert_eq!(config.tokens.estimator, EstimatorKind::Heuristic);
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[fusion]
max_tokens = 1000
diversity_weight = 0.0

[multi_hop]
max_concurrent_hops = 8

[tokens]
estimator = "tiktoken"
"#;
    let config = StrataConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.fusion.max_tokens, 1000);
    assert_eq!(config.fusion.diversity_weight, 0.0);
    // Non-overridden fields keep defaults
    assert_eq!(config.fusion.min_score, 0.1);
    assert_eq!(config.multi_hop.max_concurrent_hops, 8);
    assert_eq!(config.multi_hop.options().max_concurrent_hops, 8);
    assert_eq!(config.tokens.estimator, EstimatorKind::Tiktoken);
}

#[test]
fn config_rejects_out_of_range_threshold() {
    let toml = r#"
[fusion]
deduplication_threshold = 1.5
"#;
    let err = StrataConfig::from_toml_str(toml).unwrap_err();
    match err {
        ConfigError::InvalidValue { field, .. } => {
            assert_eq!(field, "fusion.deduplication_threshold")
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn config_rejects_malformed_toml() {
    let err = StrataConfig::from_toml_str("[fusion\nmax_tokens = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn routing_rule_overrides_are_validated() {
    let ok = r#"
[classifier.rules.FACTUAL]
VECTOR = 0.7
PROJECT = 0.3
"#;
    let config = StrataConfig::from_toml_str(ok).unwrap();
    assert_eq!(config.classifier.rules["FACTUAL"]["VECTOR"], 0.7);

    let unknown_layer = r#"
[classifier.rules.FACTUAL]
WIKI = 1.0
"#;
    assert!(StrataConfig::from_toml_str(unknown_layer).is_err());

    let unknown_type = r#"
[classifier.rules.GOSSIP]
VECTOR = 1.0
"#;
    assert!(StrataConfig::from_toml_str(unknown_type).is_err());
}

#[test]
fn env_overrides_apply_on_top_of_defaults() {
    let env: HashMap<&str, &str> = [
        ("STRATA_MAX_TOKENS", "1500"),
        ("STRATA_HOP_TIMEOUT_MS", "250"),
        ("STRATA_INFERENCE_URL", "http://inference:11434"),
    ]
    .into_iter()
    .collect();

    let mut config = StrataConfig::default();
    config
        .apply_overrides_from(|key| env.get(key).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.fusion.max_tokens, 1500);
    assert_eq!(config.combiner.max_tokens, 1500);
    assert_eq!(config.multi_hop.hop_timeout_ms, 250);
    assert!(config.inference.enabled);
    assert_eq!(config.inference.base_url, "http://inference:11434");
}

#[test]
fn env_override_with_garbage_value_is_an_error() {
    let mut config = StrataConfig::default();
    let err = config
        .apply_overrides_from(|key| (key == "STRATA_MAX_TOKENS").then(|| "lots".to_string()))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn config_roundtrips_through_toml() {
    let config = StrataConfig::default();
    let text = toml::to_string(&config).unwrap();
    let parsed = StrataConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, config);
}
