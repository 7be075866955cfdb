/// External inference service failures. Callers treat all of them as recoverable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("inference provider {provider} unavailable")]
    Unavailable { provider: String },

    #[error("inference request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("inference timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("malformed inference output: {reason}")]
    MalformedOutput { reason: String },

    #[error("inference cancelled")]
    Cancelled,
}
