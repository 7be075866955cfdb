//! Configuration for every pipeline stage.
//!
//! Every section uses `#[serde(default)]`, so a TOML file only needs the keys it
//! changes. Finding the file is the embedding application's job; this module parses,
//! layers environment overrides, and validates.

pub mod classifier_config;
pub mod decomposition_config;
pub mod defaults;
pub mod inference_config;
pub mod multi_hop_config;
pub mod router_config;
pub mod tokens_config;

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use classifier_config::ClassifierConfig;
pub use decomposition_config::DecompositionConfig;
pub use inference_config::InferenceConfig;
pub use multi_hop_config::MultiHopConfig;
pub use router_config::RouterConfig;
pub use tokens_config::{EstimatorKind, TokensConfig};

use crate::errors::ConfigError;
use crate::models::{CombineOptions, FusionOptions, LayerId, QueryType};

/// Top-level configuration aggregating all sub-configs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    pub classifier: ClassifierConfig,
    pub router: RouterConfig,
    pub fusion: FusionOptions,
    pub decomposition: DecompositionConfig,
    pub multi_hop: MultiHopConfig,
    pub combiner: CombineOptions,
    pub inference: InferenceConfig,
    pub tokens: TokensConfig,
}

impl StrataConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `STRATA_*` environment variables on top of this config.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unset keys are left alone.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STRATA_MAX_TOKENS") {
            self.fusion.max_tokens = parse_env("STRATA_MAX_TOKENS", &v)?;
            self.combiner.max_tokens = self.fusion.max_tokens;
        }
        if let Some(v) = lookup("STRATA_LAYER_TIMEOUT_MS") {
            self.router.layer_timeout_ms = parse_env("STRATA_LAYER_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("STRATA_HOP_TIMEOUT_MS") {
            self.multi_hop.hop_timeout_ms = parse_env("STRATA_HOP_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("STRATA_MAX_CONCURRENT_HOPS") {
            self.multi_hop.max_concurrent_hops = parse_env("STRATA_MAX_CONCURRENT_HOPS", &v)?;
        }
        if let Some(v) = lookup("STRATA_INFERENCE_URL") {
            self.inference.base_url = v;
            self.inference.enabled = true;
        }
        if let Some(v) = lookup("STRATA_INFERENCE_MODEL") {
            self.inference.model = v;
        }
        if self.inference.enabled {
            tracing::debug!(
                base_url = %self.inference.base_url,
                model = %self.inference.model,
                "inference enabled"
            );
        }
        self.validate()
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("classifier.min_rule_confidence", self.classifier.min_rule_confidence)?;
        check_unit("classifier.fallback_weight", self.classifier.fallback_weight)?;
        check_unit("fusion.min_score", self.fusion.min_score)?;
        check_unit(
            "fusion.deduplication_threshold",
            self.fusion.deduplication_threshold,
        )?;
        check_non_negative("fusion.diversity_weight", self.fusion.diversity_weight)?;
        check_unit("combiner.min_score", self.combiner.min_score)?;
        check_unit(
            "combiner.deduplication_threshold",
            self.combiner.deduplication_threshold,
        )?;
        check_non_negative("combiner.diversity_weight", self.combiner.diversity_weight)?;
        check_positive("router.layer_timeout_ms", self.router.layer_timeout_ms)?;
        check_positive("router.cache_capacity", self.router.cache_capacity)?;
        check_positive("multi_hop.hop_timeout_ms", self.multi_hop.hop_timeout_ms)?;
        check_positive(
            "multi_hop.max_concurrent_hops",
            self.multi_hop.max_concurrent_hops as u64,
        )?;
        check_positive(
            "decomposition.max_sub_queries",
            self.decomposition.max_sub_queries as u64,
        )?;
        check_positive(
            "inference.max_concurrent",
            self.inference.max_concurrent as u64,
        )?;

        for (type_name, layers) in &self.classifier.rules {
            QueryType::from_str(type_name).map_err(|e| ConfigError::InvalidValue {
                field: format!("classifier.rules.{type_name}"),
                reason: e.to_string(),
            })?;
            if layers.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("classifier.rules.{type_name}"),
                    reason: "a routing rule must select at least one layer".to_string(),
                });
            }
            for (layer_name, weight) in layers {
                let field = format!("classifier.rules.{type_name}.{layer_name}");
                LayerId::from_str(layer_name).map_err(|e| ConfigError::InvalidValue {
                    field: field.clone(),
                    reason: e.to_string(),
                })?;
                check_unit(&field, *weight)?;
            }
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        field: key.to_string(),
        reason: e.to_string(),
    })
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be within [0, 1], got {value}"),
        });
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be a non-negative number, got {value}"),
        });
    }
    Ok(())
}

fn check_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
