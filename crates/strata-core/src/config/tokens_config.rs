use serde::{Deserialize, Serialize};

use super::defaults;

/// Which token estimator the fusion stages use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// ceil(chars / 4). Cheap and deterministic.
    Heuristic,
    /// cl100k_base BPE via tiktoken.
    Tiktoken,
}

/// Token estimation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensConfig {
    pub estimator: EstimatorKind,
    pub cache_capacity: u64,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorKind::Heuristic,
            cache_capacity: defaults::DEFAULT_TOKEN_CACHE_CAPACITY,
        }
    }
}
