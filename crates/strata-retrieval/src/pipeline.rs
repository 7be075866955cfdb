//! Single-hop pipeline: classify → route → fuse.

use strata_core::errors::{StrataError, StrataResult};
use strata_core::models::{ClassificationResult, FusedResult, FusionOptions, RoutingResult};
use strata_observability::tracing_setup::events;
use tokio_util::sync::CancellationToken;

use crate::classify::ClassifierChain;
use crate::fusion::FusionEngine;
use crate::routing::MemoryRouter;

/// Output of one single-hop run. The classification lives in `routing`.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub routing: RoutingResult,
    pub fused: FusedResult,
}

impl PipelineOutput {
    pub fn classification(&self) -> &ClassificationResult {
        &self.routing.classification
    }
}

/// The three single-hop stages, shared by the engine and every multi-hop hop.
pub struct Pipeline {
    classifier: ClassifierChain,
    router: MemoryRouter,
    fusion: FusionEngine,
}

impl Pipeline {
    pub fn new(classifier: ClassifierChain, router: MemoryRouter, fusion: FusionEngine) -> Self {
        Self {
            classifier,
            router,
            fusion,
        }
    }

    pub fn classifier(&self) -> &ClassifierChain {
        &self.classifier
    }

    pub fn router(&self) -> &MemoryRouter {
        &self.router
    }

    pub fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    /// Run the three stages on `query`.
    ///
    /// Cancellation before classification completes is an error. Once classified,
    /// a cancelled run still returns whatever the layers delivered.
    pub async fn run(
        &self,
        query: &str,
        fusion_options: &FusionOptions,
        cancel: &CancellationToken,
    ) -> StrataResult<PipelineOutput> {
        fusion_options.validate()?;
        if cancel.is_cancelled() {
            events::query_cancelled(query, "classification");
            return Err(StrataError::Cancelled);
        }

        let classification = self.classifier.classify(query, cancel).await;
        if cancel.is_cancelled() {
            events::query_cancelled(query, "classification");
            return Err(StrataError::Cancelled);
        }

        let routing = self.router.route(query, &classification, cancel).await;
        if routing.stats.cancelled {
            events::query_cancelled(query, "routing");
        }

        let fused = self.fusion.fuse(&routing.layers, fusion_options)?;
        Ok(PipelineOutput { routing, fused })
    }
}
