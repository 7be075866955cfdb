use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::errors::{StrataError, StrataResult};

/// A decomposed unit of a compound query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuery {
    pub id: String,
    pub text: String,
    /// Ids of earlier sub-queries this one depends on.
    pub dependencies: Vec<String>,
    /// Higher runs first when ordering is otherwise free.
    pub priority: u32,
}

impl SubQuery {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            dependencies: Vec::new(),
            priority: 0,
        }
    }
}

/// How the sub-query graph is executed. Advisory: describes the computed wave shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Waves of one sub-query each, ordered by priority.
    Sequential,
    /// A single wave. Only valid without dependencies.
    Parallel,
    /// Waves derived from dependency levels.
    Hybrid,
}

/// Outcome of decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    pub is_complex: bool,
    pub original_query: String,
    pub sub_queries: Vec<SubQuery>,
    pub strategy: ExecutionStrategy,
    pub reasoning: String,
    pub complexity_indicators: usize,
}

impl DecompositionResult {
    /// The pass-through decomposition: one sub-query equal to the original query.
    pub fn simple(
        query: impl Into<String>,
        complexity_indicators: usize,
        reasoning: impl Into<String>,
    ) -> Self {
        let query = query.into();
        Self {
            is_complex: false,
            sub_queries: vec![SubQuery::new("sq-0", query.clone())],
            original_query: query,
            strategy: ExecutionStrategy::Sequential,
            reasoning: reasoning.into(),
            complexity_indicators,
        }
    }

    pub fn sub_query(&self, id: &str) -> Option<&SubQuery> {
        self.sub_queries.iter().find(|sq| sq.id == id)
    }

    pub fn has_dependencies(&self) -> bool {
        self.sub_queries.iter().any(|sq| !sq.dependencies.is_empty())
    }
}

/// Decomposition tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionOptions {
    pub max_sub_queries: usize,
    pub min_complexity_indicators: usize,
}

impl Default for DecompositionOptions {
    fn default() -> Self {
        Self {
            max_sub_queries: defaults::DEFAULT_MAX_SUB_QUERIES,
            min_complexity_indicators: defaults::DEFAULT_MIN_COMPLEXITY_INDICATORS,
        }
    }
}

impl DecompositionOptions {
    pub fn validate(&self) -> StrataResult<()> {
        if self.max_sub_queries == 0 {
            return Err(StrataError::invalid_input(
                "max_sub_queries must be at least 1",
            ));
        }
        Ok(())
    }
}
