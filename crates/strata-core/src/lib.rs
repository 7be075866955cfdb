//! # strata-core
//!
//! Foundation crate for the Strata query routing engine.
//! Defines the data model, the traits consumed from collaborators (memory layers,
//! inference, caching, token estimation), errors, and config.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::StrataConfig;
pub use errors::{StrataError, StrataResult};
pub use models::{
    ClassificationResult, DecompositionResult, FusedItem, FusedResult, HopResult, LayerId,
    LayerItem, LayerResult, MultiHopResult, QueryType, RoutingResult, SubQuery,
};
