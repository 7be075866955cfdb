use super::{
    ClassificationError, ConfigError, DecompositionError, InferenceError, LayerError,
};

/// Top-level error for the Strata engine.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("query cancelled before classification completed")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Decomposition(#[from] DecompositionError),

    #[error("tokenizer unavailable: {reason}")]
    Tokenizer { reason: String },
}

impl StrataError {
    /// Shorthand for [`StrataError::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Whether the error is a caller mistake that must not be retried.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::Config(_))
    }
}

pub type StrataResult<T> = Result<T, StrataError>;
