//! Classifier backed by an external inference call.
//!
//! The model must answer `{"type": <QUERY_TYPE>, "confidence": <0..1>}`. Anything
//! else (unknown type, out-of-range confidence, extra or missing fields) is a
//! schema violation, never a guess.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use strata_core::errors::{ClassificationError, InferenceError};
use strata_core::models::{ClassificationResult, ClassificationSource, QueryType};
use strata_core::traits::InferenceClient;
use tokio_util::sync::CancellationToken;

use super::{Classifier, RoutingTable};
use crate::inference::complete_bounded;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Verdict {
    #[serde(rename = "type")]
    query_type: String,
    confidence: f64,
}

pub struct InferenceClassifier {
    client: Arc<dyn InferenceClient>,
    table: Arc<RoutingTable>,
    timeout: Duration,
}

impl InferenceClassifier {
    pub fn new(client: Arc<dyn InferenceClient>, table: Arc<RoutingTable>, timeout: Duration) -> Self {
        Self {
            client,
            table,
            timeout,
        }
    }

    /// JSON schema constraining the model's answer.
    pub fn verdict_schema() -> serde_json::Value {
        let types: Vec<&str> = QueryType::ALL.iter().map(|t| t.as_str()).collect();
        serde_json::json!({
            "type": "object",
            "properties": {
                "type": { "type": "string", "enum": types },
                "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
            },
            "required": ["type", "confidence"],
            "additionalProperties": false
        })
    }

    fn prompt(query: &str) -> String {
        format!(
            "Classify the developer query below into exactly one type.\n\
             PROCEDURAL: continuing or performing a task.\n\
             FACTUAL: what something is or how it works.\n\
             ARCHITECTURAL: structure, modules, dependencies.\n\
             USER: the user's own preferences or habits.\n\
             HISTORICAL: past decisions and their reasons.\n\
             GENERAL: none of the above.\n\
             Answer with JSON {{\"type\": TYPE, \"confidence\": 0..1}}.\n\n\
             Query: {query}"
        )
    }

    /// Validate a raw inference value into a classification.
    pub fn parse_verdict(
        &self,
        query: &str,
        value: serde_json::Value,
    ) -> Result<ClassificationResult, ClassificationError> {
        let verdict: Verdict =
            serde_json::from_value(value).map_err(|e| ClassificationError::SchemaViolation {
                reason: e.to_string(),
            })?;
        let query_type = QueryType::from_str(&verdict.query_type).map_err(|e| {
            ClassificationError::SchemaViolation {
                reason: e.to_string(),
            }
        })?;
        if !verdict.confidence.is_finite() || !(0.0..=1.0).contains(&verdict.confidence) {
            return Err(ClassificationError::SchemaViolation {
                reason: format!("confidence {} outside [0, 1]", verdict.confidence),
            });
        }
        Ok(ClassificationResult::new(
            query,
            query_type,
            verdict.confidence,
            self.table.weights(query_type),
            format!("inference via {}", self.client.name()),
            ClassificationSource::Inference,
        ))
    }
}

#[async_trait]
impl Classifier for InferenceClassifier {
    fn name(&self) -> &'static str {
        "inference"
    }

    async fn classify(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<ClassificationResult, ClassificationError> {
        let value = complete_bounded(
            self.client.as_ref(),
            &Self::prompt(query),
            &Self::verdict_schema(),
            self.timeout,
            cancel,
        )
        .await
        .map_err(|e| match e {
            InferenceError::Timeout { after_ms } => ClassificationError::Timeout { after_ms },
            InferenceError::Cancelled => ClassificationError::Cancelled,
            InferenceError::Unavailable { .. } => ClassificationError::InferenceUnavailable,
            other => ClassificationError::Inference(other),
        })?;
        self.parse_verdict(query, value)
    }
}
