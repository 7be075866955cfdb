//! Inference plumbing: a bounded call helper, a process-wide rate limiter, and the
//! Ollama client.

pub mod ollama;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use strata_core::errors::InferenceError;
use strata_core::traits::InferenceClient;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub use ollama::OllamaInference;

/// Call `client` bounded by `timeout` and `cancel`, whichever fires first.
pub async fn complete_bounded(
    client: &dyn InferenceClient,
    prompt: &str,
    schema: &serde_json::Value,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<serde_json::Value, InferenceError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(InferenceError::Cancelled),
        res = tokio::time::timeout(timeout, client.complete_json(prompt, schema)) => match res {
            Ok(inner) => inner,
            Err(_) => Err(InferenceError::Timeout {
                after_ms: timeout.as_millis() as u64,
            }),
        },
    }
}

/// Caps the number of in-flight inference calls across every query sharing it.
pub struct RateLimitedInference {
    inner: Arc<dyn InferenceClient>,
    permits: Arc<Semaphore>,
}

impl RateLimitedInference {
    pub fn new(inner: Arc<dyn InferenceClient>, max_concurrent: usize) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl InferenceClient for RateLimitedInference {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete_json(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, InferenceError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| InferenceError::Unavailable {
                provider: self.inner.name().to_string(),
            })?;
        self.inner.complete_json(prompt, schema).await
    }
}
