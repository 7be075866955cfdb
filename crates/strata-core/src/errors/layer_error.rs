use serde::{Deserialize, Serialize};

use crate::models::LayerId;

/// A single memory layer's failure within one routing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerError {
    #[error("layer {layer} query failed: {reason}")]
    QueryFailed { layer: LayerId, reason: String },

    #[error("layer {layer} timed out after {after_ms}ms")]
    Timeout { layer: LayerId, after_ms: u64 },

    #[error("layer {layer} cancelled")]
    Cancelled { layer: LayerId },

    #[error("layer {layer} is not registered with the router")]
    NotRegistered { layer: LayerId },

    #[error("layer {layer} task aborted: {reason}")]
    Aborted { layer: LayerId, reason: String },
}

impl LayerError {
    /// The layer this error belongs to.
    pub fn layer(&self) -> LayerId {
        match self {
            Self::QueryFailed { layer, .. }
            | Self::Timeout { layer, .. }
            | Self::Cancelled { layer }
            | Self::NotRegistered { layer }
            | Self::Aborted { layer, .. } => *layer,
        }
    }
}
