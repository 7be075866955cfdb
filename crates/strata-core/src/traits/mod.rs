//! Capabilities the core consumes from its collaborators.

pub mod inference;
pub mod memory_layer;
pub mod routing_cache;
pub mod token_estimator;

pub use inference::InferenceClient;
pub use memory_layer::{LayerQueryOptions, MemoryLayer};
pub use routing_cache::RoutingCache;
pub use token_estimator::TokenEstimator;
