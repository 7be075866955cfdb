//! Span definitions per pipeline stage: classification, routing, fusion,
//! decomposition, multi-hop waves and hops, combination.

/// Create a classification span.
#[macro_export]
macro_rules! classification_span {
    ($query:expr) => {
        tracing::info_span!("strata.classification", query = %$query)
    };
}

/// Create a routing span.
#[macro_export]
macro_rules! routing_span {
    ($query:expr, $query_type:expr) => {
        tracing::info_span!("strata.routing", query = %$query, query_type = %$query_type)
    };
}

/// Create a fusion span.
#[macro_export]
macro_rules! fusion_span {
    ($layer_count:expr, $max_tokens:expr) => {
        tracing::debug_span!("strata.fusion", layers = $layer_count, max_tokens = $max_tokens)
    };
}

/// Create a decomposition span.
#[macro_export]
macro_rules! decomposition_span {
    ($query:expr) => {
        tracing::info_span!("strata.decomposition", query = %$query)
    };
}

/// Create a span for one multi-hop wave.
#[macro_export]
macro_rules! wave_span {
    ($wave:expr, $size:expr) => {
        tracing::info_span!("strata.wave", wave = $wave, size = $size)
    };
}

/// Create a span for one hop.
#[macro_export]
macro_rules! hop_span {
    ($sub_query_id:expr, $wave:expr) => {
        tracing::info_span!("strata.hop", sub_query = %$sub_query_id, wave = $wave)
    };
}

/// Create a combination span.
#[macro_export]
macro_rules! combination_span {
    ($hop_count:expr) => {
        tracing::debug_span!("strata.combination", hops = $hop_count)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const CLASSIFICATION: &str = "strata.classification";
    pub const ROUTING: &str = "strata.routing";
    pub const FUSION: &str = "strata.fusion";
    pub const DECOMPOSITION: &str = "strata.decomposition";
    pub const WAVE: &str = "strata.wave";
    pub const HOP: &str = "strata.hop";
    pub const COMBINATION: &str = "strata.combination";
}
