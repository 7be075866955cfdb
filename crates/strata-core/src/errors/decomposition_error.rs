use super::InferenceError;

/// Decomposition failures. Recovered by falling back to single-hop execution.
#[derive(Debug, thiserror::Error)]
pub enum DecompositionError {
    #[error("dependency cycle among sub-queries: {involving:?}")]
    Cycle { involving: Vec<String> },

    #[error("sub-query {sub_query} depends on unknown id {dependency}")]
    UnknownDependency {
        sub_query: String,
        dependency: String,
    },

    #[error("sub-query {sub_query} depends on later sub-query {dependency}")]
    ForwardDependency {
        sub_query: String,
        dependency: String,
    },

    #[error("duplicate sub-query id {id}")]
    DuplicateId { id: String },

    #[error("decomposition produced no usable sub-queries")]
    Empty,

    #[error("decomposition output violated schema: {reason}")]
    SchemaViolation { reason: String },

    #[error(transparent)]
    Inference(#[from] InferenceError),
}
