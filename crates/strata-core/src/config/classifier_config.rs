use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Query classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Rule matches below this confidence are handed to inference.
    pub min_rule_confidence: f64,
    /// Consult the inference service when rules are not confident.
    pub use_inference: bool,
    pub inference_timeout_ms: u64,
    /// Weight given to every layer by the GENERAL fallback.
    pub fallback_weight: f64,
    /// Routing rule overrides: query type name → (layer name → weight).
    /// An override replaces the whole rule for that type.
    pub rules: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_rule_confidence: defaults::DEFAULT_MIN_RULE_CONFIDENCE,
            use_inference: true,
            inference_timeout_ms: defaults::DEFAULT_CLASSIFIER_INFERENCE_TIMEOUT_MS,
            fallback_weight: defaults::DEFAULT_FALLBACK_LAYER_WEIGHT,
            rules: BTreeMap::new(),
        }
    }
}

impl ClassifierConfig {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}
