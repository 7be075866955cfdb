use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{LayerId, QueryType};

/// Which classifier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Rules,
    Inference,
    Fallback,
}

/// Outcome of classifying one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub query: String,
    pub query_type: QueryType,
    /// Always within [0, 1].
    pub confidence: f64,
    pub layers: BTreeSet<LayerId>,
    /// Keys are always a subset of `layers`.
    pub weights: BTreeMap<LayerId, f64>,
    pub reasoning: String,
    pub source: ClassificationSource,
}

impl ClassificationResult {
    /// Build a result from a routing rule. Confidence is clamped into [0, 1] and the
    /// layer set is derived from the weight map, so the subset invariant holds.
    pub fn new(
        query: impl Into<String>,
        query_type: QueryType,
        confidence: f64,
        weights: BTreeMap<LayerId, f64>,
        reasoning: impl Into<String>,
        source: ClassificationSource,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            query: query.into(),
            query_type,
            confidence,
            layers: weights.keys().copied().collect(),
            weights,
            reasoning: reasoning.into(),
            source,
        }
    }

    /// The degraded classification used whenever classification fails: GENERAL,
    /// zero confidence, every layer at `fallback_weight`.
    pub fn fallback(query: impl Into<String>, fallback_weight: f64, reason: impl Into<String>) -> Self {
        let weights = LayerId::ALL
            .into_iter()
            .map(|layer| (layer, fallback_weight))
            .collect();
        Self::new(
            query,
            QueryType::General,
            0.0,
            weights,
            reason,
            ClassificationSource::Fallback,
        )
    }

    /// Weight for a layer; 0.0 if the layer was not selected.
    pub fn weight_for(&self, layer: LayerId) -> f64 {
        self.weights.get(&layer).copied().unwrap_or(0.0)
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ClassificationSource::Fallback
    }
}
