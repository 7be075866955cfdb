//! Error handling for Strata.
//! One error enum per subsystem, `thiserror` only, aggregated into [`StrataError`].
//!
//! Only [`StrataError::InvalidInput`] and [`StrataError::Cancelled`] ever reach a caller
//! of the query pipeline. Everything else is recovered where it happens and surfaced as
//! data (error fields and stats) on the result objects.

pub mod classification_error;
pub mod config_error;
pub mod decomposition_error;
pub mod inference_error;
pub mod layer_error;
pub mod strata_error;

pub use classification_error::ClassificationError;
pub use config_error::ConfigError;
pub use decomposition_error::DecompositionError;
pub use inference_error::InferenceError;
pub use layer_error::LayerError;
pub use strata_error::{StrataError, StrataResult};

/// A string did not name any variant of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
