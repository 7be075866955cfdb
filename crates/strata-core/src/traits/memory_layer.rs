use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::LayerError;
use crate::models::{LayerId, LayerItem};

/// Per-call options handed to a layer.
#[derive(Debug, Clone)]
pub struct LayerQueryOptions {
    /// Maximum items the layer should return.
    pub limit: usize,
    /// The router enforces this too; layers may use it to bound their own I/O.
    pub timeout: Duration,
    /// Cancelled when the owning query is cancelled or its deadline passes.
    pub cancel: CancellationToken,
}

/// A memory layer: one independent knowledge source.
///
/// Implementations must be safe to call concurrently and should stop promptly
/// once `opts.cancel` fires.
#[async_trait]
pub trait MemoryLayer: Send + Sync {
    fn id(&self) -> LayerId;

    async fn query(
        &self,
        text: &str,
        opts: &LayerQueryOptions,
    ) -> Result<Vec<LayerItem>, LayerError>;
}
