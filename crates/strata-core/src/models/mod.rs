//! Data model shared by every pipeline stage.
//!
//! Everything here is created and discarded within one query; nothing persists.

pub mod classification;
pub mod decomposition;
pub mod fusion;
pub mod layer;
pub mod multi_hop;
pub mod query_type;
pub mod routing;

pub use classification::{ClassificationResult, ClassificationSource};
pub use decomposition::{
    DecompositionOptions, DecompositionResult, ExecutionStrategy, SubQuery,
};
pub use fusion::{FusedItem, FusedResult, FusionOptions, FusionStats};
pub use layer::{LayerId, LayerItem, Metadata};
pub use multi_hop::{
    CombineOptions, CombineStats, CombinedContext, HopResult, MultiHopOptions, MultiHopResult,
    MultiHopStats,
};
pub use query_type::QueryType;
pub use routing::{LayerResult, RoutingCacheKey, RoutingResult, RoutingStats};
