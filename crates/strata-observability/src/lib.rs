//! # strata-observability
//!
//! Structured tracing for the routing pipeline: subscriber setup, span macros per
//! pipeline stage, and event helpers for every recovered failure so degraded
//! results are never silent.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, init_tracing_with_filter};
