use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// External inference service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub request_timeout_ms: u64,
    /// Process-wide cap on concurrent inference calls.
    pub max_concurrent: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_INFERENCE_ENABLED,
            base_url: defaults::DEFAULT_INFERENCE_BASE_URL.to_string(),
            model: defaults::DEFAULT_INFERENCE_MODEL.to_string(),
            request_timeout_ms: defaults::DEFAULT_INFERENCE_REQUEST_TIMEOUT_MS,
            max_concurrent: defaults::DEFAULT_INFERENCE_MAX_CONCURRENT,
        }
    }
}

impl InferenceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
