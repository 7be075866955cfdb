//! Ollama structured-output client.
//!
//! Posts to `/api/generate` with the JSON schema in `format`, so the model's reply is
//! constrained to it. The reply text is then parsed as JSON; validation against the
//! caller's types happens upstream.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strata_core::config::InferenceConfig;
use strata_core::errors::InferenceError;
use strata_core::traits::InferenceClient;
use tracing::debug;

/// Ollama inference client.
pub struct OllamaInference {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    format: &'a serde_json::Value,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaInference {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| InferenceError::Unavailable {
                provider: format!("ollama: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl InferenceClient for OllamaInference {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete_json(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, InferenceError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            format: schema,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::RequestFailed {
                reason: format!("Ollama HTTP error: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::RequestFailed {
                reason: format!("Ollama returned {status}: {body}"),
            });
        }

        let body: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| InferenceError::MalformedOutput {
                    reason: format!("Ollama JSON parse error: {e}"),
                })?;

        debug!(model = %self.model, bytes = body.response.len(), "ollama completion");

        serde_json::from_str(&body.response).map_err(|e| InferenceError::MalformedOutput {
            reason: format!("completion is not JSON: {e}"),
        })
    }
}
