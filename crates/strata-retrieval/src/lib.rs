//! # strata-retrieval
//!
//! Query routing and context fusion over independent memory layers.
//!
//! ```text
//! query ─► Decomposer ─┬─► single hop:  Classifier ─► Router ─► Fusion
//!                      │
//!                      └─► multi hop:   MultiHopRouter (waves of single hops)
//!                                            │
//!                                            ▼
//!                                         Combiner ─► final context
//! ```
//!
//! - [`classify`]: rule table first, inference second, GENERAL fallback last.
//! - [`routing`]: one task per selected layer, per-layer timeout, TTL cache.
//! - [`fusion`]: normalize, re-weight with diversity, dedup, token budget.
//! - [`decompose`]: compound query → dependency DAG of sub-queries.
//! - [`multi_hop`]: wave-by-wave execution of the DAG.
//! - [`combine`]: cross-hop ranking with provenance.
//! - [`engine`]: [`QueryEngine`], the entry point wiring it all from `StrataConfig`.

pub mod classify;
pub mod combine;
pub mod decompose;
pub mod engine;
pub mod fusion;
pub mod inference;
pub mod multi_hop;
pub mod pipeline;
pub mod routing;
pub mod text;

pub use classify::{Classifier, ClassifierChain, InferenceClassifier, RoutingTable, RuleClassifier};
pub use combine::ResultCombiner;
pub use decompose::QueryDecomposer;
pub use engine::{QueryEngine, QueryEngineBuilder, QueryOptions, QueryOutcome};
pub use fusion::FusionEngine;
pub use inference::{OllamaInference, RateLimitedInference};
pub use multi_hop::MultiHopRouter;
pub use pipeline::{Pipeline, PipelineOutput};
pub use routing::{MemoryRouter, MokaRoutingCache};
