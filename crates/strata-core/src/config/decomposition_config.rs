use serde::{Deserialize, Serialize};

use crate::models::DecompositionOptions;

use super::defaults;

/// Query decomposer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    pub enabled: bool,
    pub max_sub_queries: usize,
    pub min_complexity_indicators: usize,
    /// Ask the inference service to split queries the rules flag but cannot split.
    pub use_inference: bool,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_DECOMPOSITION_ENABLED,
            max_sub_queries: defaults::DEFAULT_MAX_SUB_QUERIES,
            min_complexity_indicators: defaults::DEFAULT_MIN_COMPLEXITY_INDICATORS,
            use_inference: true,
        }
    }
}

impl DecompositionConfig {
    pub fn options(&self) -> DecompositionOptions {
        DecompositionOptions {
            max_sub_queries: self.max_sub_queries,
            min_complexity_indicators: self.min_complexity_indicators,
        }
    }
}
