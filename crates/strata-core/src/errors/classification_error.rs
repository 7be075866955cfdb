use crate::models::QueryType;

use super::InferenceError;

/// Classifier failures. Always recovered by the classifier chain.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("no classification rule matched")]
    NoRuleMatched,

    #[error("best rule match {best} scored {confidence:.2}, below threshold {threshold:.2}")]
    LowConfidence {
        best: QueryType,
        confidence: f64,
        threshold: f64,
    },

    #[error("inference output violated schema: {reason}")]
    SchemaViolation { reason: String },

    #[error("classification timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("classification cancelled")]
    Cancelled,

    #[error("no inference client configured")]
    InferenceUnavailable,

    #[error(transparent)]
    Inference(#[from] InferenceError),
}
