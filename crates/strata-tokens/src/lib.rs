//! # strata-tokens
//!
//! Token estimation for context budgets.
//! `TokenCounter` counts exactly with `tiktoken-rs` (`cl100k_base`) and caches per
//! content hash; `HeuristicEstimator` approximates with characters / 4.
//! Both implement `strata_core::traits::TokenEstimator`.

pub mod budget;
pub mod counter;
pub mod heuristic;

pub use budget::prefix_within;
pub use counter::TokenCounter;
pub use heuristic::HeuristicEstimator;
