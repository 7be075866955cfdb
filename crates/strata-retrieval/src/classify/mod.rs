//! Query classification.
//!
//! Classifiers form a chain: the lexical rule table answers first, the inference
//! classifier second, and if every link fails the chain degrades to GENERAL with zero
//! confidence over the full layer set. The chain itself never fails.

pub mod inference_classifier;
pub mod routing_table;
pub mod rules;

use std::sync::Arc;

use async_trait::async_trait;
use strata_core::errors::ClassificationError;
use strata_core::models::{ClassificationResult, ClassificationSource};
use strata_observability::classification_span;
use strata_observability::tracing_setup::events;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

pub use inference_classifier::InferenceClassifier;
pub use routing_table::RoutingTable;
pub use rules::{evaluate, RuleMatch};

/// One link in the classifier chain.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn classify(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<ClassificationResult, ClassificationError>;
}

/// Classifies with the static rule table.
pub struct RuleClassifier {
    table: Arc<RoutingTable>,
    min_confidence: f64,
}

impl RuleClassifier {
    pub fn new(table: Arc<RoutingTable>, min_confidence: f64) -> Self {
        Self {
            table,
            min_confidence,
        }
    }

    /// Synchronous core of [`Classifier::classify`].
    pub fn evaluate(&self, query: &str) -> Result<ClassificationResult, ClassificationError> {
        let m = rules::evaluate(query);
        let Some(best) = m.best else {
            return Err(ClassificationError::NoRuleMatched);
        };
        if m.confidence < self.min_confidence {
            return Err(ClassificationError::LowConfidence {
                best,
                confidence: m.confidence,
                threshold: self.min_confidence,
            });
        }
        Ok(ClassificationResult::new(
            query,
            best,
            m.confidence,
            self.table.weights(best),
            format!("matched rules: {}", m.matched.join(", ")),
            ClassificationSource::Rules,
        ))
    }
}

#[async_trait]
impl Classifier for RuleClassifier {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn classify(
        &self,
        query: &str,
        _cancel: &CancellationToken,
    ) -> Result<ClassificationResult, ClassificationError> {
        self.evaluate(query)
    }
}

/// Ordered classifiers with a GENERAL fallback.
pub struct ClassifierChain {
    classifiers: Vec<Box<dyn Classifier>>,
    fallback_weight: f64,
}

impl ClassifierChain {
    pub fn new(fallback_weight: f64) -> Self {
        Self {
            classifiers: Vec::new(),
            fallback_weight,
        }
    }

    pub fn with(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifiers.push(classifier);
        self
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// The result used whenever classification cannot produce a verdict.
    pub fn fallback(&self, query: &str, reason: impl Into<String>) -> ClassificationResult {
        ClassificationResult::fallback(query, self.fallback_weight, reason)
    }

    /// First successful verdict in chain order, otherwise the fallback.
    pub async fn classify(&self, query: &str, cancel: &CancellationToken) -> ClassificationResult {
        let span = classification_span!(query);
        async {
            let mut failures = Vec::new();
            for classifier in &self.classifiers {
                if cancel.is_cancelled() {
                    failures.push(format!("{}: cancelled", classifier.name()));
                    break;
                }
                match classifier.classify(query, cancel).await {
                    Ok(result) => {
                        debug!(
                            classifier = classifier.name(),
                            query_type = %result.query_type,
                            confidence = result.confidence,
                            "classified"
                        );
                        return result;
                    }
                    Err(e) => {
                        debug!(classifier = classifier.name(), error = %e, "classifier declined");
                        failures.push(format!("{}: {e}", classifier.name()));
                    }
                }
            }

            let reason = if failures.is_empty() {
                "no classifier configured".to_string()
            } else {
                failures.join("; ")
            };
            events::degradation_triggered("classifier", &reason, "GENERAL");
            self.fallback(query, format!("fallback to GENERAL ({reason})"))
        }
        .instrument(span)
        .await
    }
}
