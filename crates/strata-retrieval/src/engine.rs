//! QueryEngine: the entry point. Wires every stage from a `StrataConfig` and
//! decides per query between a single hop and a multi-hop run.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use strata_core::config::EstimatorKind;
use strata_core::errors::{StrataError, StrataResult};
use strata_core::models::{
    ClassificationResult, CombinedContext, DecompositionResult, FusedItem, FusedResult,
    FusionOptions, HopResult, LayerResult, MultiHopResult, RoutingResult,
};
use strata_core::traits::{InferenceClient, MemoryLayer, RoutingCache, TokenEstimator};
use strata_core::StrataConfig;
use strata_tokens::{HeuristicEstimator, TokenCounter};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::classify::{ClassifierChain, InferenceClassifier, RoutingTable, RuleClassifier};
use crate::combine::ResultCombiner;
use crate::decompose::QueryDecomposer;
use crate::fusion::FusionEngine;
use crate::inference::{OllamaInference, RateLimitedInference};
use crate::multi_hop::MultiHopRouter;
use crate::pipeline::Pipeline;
use crate::routing::{MemoryRouter, MokaRoutingCache};

/// Per-call knobs for [`QueryEngine::route_query`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Cancels every in-flight layer call, inference call and hop.
    pub cancel: Option<CancellationToken>,
    /// Wall-clock budget for the whole call. On expiry the call is cancelled and
    /// returns what it has.
    pub deadline: Option<Duration>,
    /// Skip decomposition and run the query as one hop.
    pub force_single_hop: bool,
    /// Overrides the configured fusion options.
    pub fusion: Option<FusionOptions>,
}

/// What a query produced.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    SingleHop {
        routing: RoutingResult,
        fused: FusedResult,
    },
    MultiHop(MultiHopResult),
}

impl QueryOutcome {
    /// The final ranked context, whichever path produced it.
    pub fn context(&self) -> &[FusedItem] {
        match self {
            Self::SingleHop { fused, .. } => &fused.items,
            Self::MultiHop(result) => &result.combined_context,
        }
    }

    pub fn is_multi_hop(&self) -> bool {
        matches!(self, Self::MultiHop(_))
    }
}

/// Builder for [`QueryEngine`]. Layers and collaborators are injected; everything
/// else comes from the config.
pub struct QueryEngineBuilder {
    config: StrataConfig,
    layers: Vec<Arc<dyn MemoryLayer>>,
    inference: Option<Arc<dyn InferenceClient>>,
    cache: Option<Arc<dyn RoutingCache>>,
    estimator: Option<Arc<dyn TokenEstimator>>,
}

impl QueryEngineBuilder {
    pub fn with_layer(mut self, layer: Arc<dyn MemoryLayer>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Use this client instead of building one from `[inference]`.
    pub fn with_inference(mut self, client: Arc<dyn InferenceClient>) -> Self {
        self.inference = Some(client);
        self
    }

    /// Use this routing cache instead of the moka-backed default.
    pub fn with_cache(mut self, cache: Arc<dyn RoutingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn build(self) -> StrataResult<QueryEngine> {
        let config = self.config;
        config.validate()?;

        // Step 1: inference client, rate limited whether injected or built.
        let inference: Option<Arc<dyn InferenceClient>> = match self.inference {
            Some(client) => Some(client),
            None if config.inference.enabled => Some(
                Arc::new(OllamaInference::new(&config.inference)?) as Arc<dyn InferenceClient>,
            ),
            None => None,
        }
        .map(|client| {
            Arc::new(RateLimitedInference::new(client, config.inference.max_concurrent))
                as Arc<dyn InferenceClient>
        });

        // Step 2: token estimator.
        let estimator: Arc<dyn TokenEstimator> = match self.estimator {
            Some(estimator) => estimator,
            None => match config.tokens.estimator {
                EstimatorKind::Heuristic => Arc::new(HeuristicEstimator::default()),
                EstimatorKind::Tiktoken => {
                    Arc::new(TokenCounter::new(config.tokens.cache_capacity)?)
                }
            },
        };

        // Step 3: classifier chain.
        let table = Arc::new(RoutingTable::from_config(&config.classifier)?);
        let mut classifier = ClassifierChain::new(config.classifier.fallback_weight).with(
            Box::new(RuleClassifier::new(
                Arc::clone(&table),
                config.classifier.min_rule_confidence,
            )),
        );
        if let (true, Some(client)) = (config.classifier.use_inference, &inference) {
            classifier = classifier.with(Box::new(InferenceClassifier::new(
                Arc::clone(client),
                table,
                config.classifier.inference_timeout(),
            )));
        }

        // Step 4: router and cache.
        let mut router = MemoryRouter::new(&config.router);
        let layer_count = self.layers.len();
        for layer in self.layers {
            router = router.with_layer(layer);
        }
        let cache = match self.cache {
            Some(cache) => Some(cache),
            None if config.router.cache_enabled => Some(
                Arc::new(MokaRoutingCache::from_config(&config.router)) as Arc<dyn RoutingCache>,
            ),
            None => None,
        };
        if let Some(cache) = cache {
            router = router.with_cache(cache);
        }

        // Step 5: pipeline, multi-hop router, decomposer.
        let pipeline = Arc::new(Pipeline::new(
            classifier,
            router,
            FusionEngine::new(Arc::clone(&estimator)),
        ));
        let multi_hop = MultiHopRouter::new(
            Arc::clone(&pipeline),
            ResultCombiner::new(Arc::clone(&estimator)),
        )
        .with_fusion_options(config.fusion)
        .with_combine_options(config.combiner)
        .with_dependency_context(config.multi_hop.pass_dependency_context);

        let mut decomposer = QueryDecomposer::new();
        if let (true, Some(client)) = (config.decomposition.use_inference, &inference) {
            decomposer =
                decomposer.with_inference(Arc::clone(client), config.inference.request_timeout());
        }

        info!(
            layers = layer_count,
            inference = inference.is_some(),
            estimator = estimator.name(),
            classifiers = pipeline.classifier().len(),
            "query engine built"
        );

        Ok(QueryEngine {
            config,
            pipeline,
            decomposer,
            multi_hop,
        })
    }
}

pub struct QueryEngine {
    config: StrataConfig,
    pipeline: Arc<Pipeline>,
    decomposer: QueryDecomposer,
    multi_hop: MultiHopRouter,
}

impl QueryEngine {
    pub fn builder(config: StrataConfig) -> QueryEngineBuilder {
        QueryEngineBuilder {
            config,
            layers: Vec::new(),
            inference: None,
            cache: None,
            estimator: None,
        }
    }

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Answer `query`: decompose, then run one hop or the multi-hop graph.
    ///
    /// An empty query or invalid options is an error, as is cancellation before
    /// classification of a single-hop query completes. Everything else degrades
    /// into the returned data.
    pub async fn route_query(&self, query: &str, options: QueryOptions) -> StrataResult<QueryOutcome> {
        if query.trim().is_empty() {
            return Err(StrataError::invalid_input("query must not be empty"));
        }
        let token = options
            .cancel
            .as_ref()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        with_deadline(
            self.route_query_inner(query, &options, &token),
            options.deadline,
            &token,
        )
        .await
    }

    async fn route_query_inner(
        &self,
        query: &str,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> StrataResult<QueryOutcome> {
        let fusion_options = options.fusion.unwrap_or(self.config.fusion);
        fusion_options.validate()?;

        if self.config.decomposition.enabled && !options.force_single_hop {
            let started = Instant::now();
            let decomposition = self.decompose(query, cancel).await?;
            let decomposition_time = started.elapsed();

            if decomposition.is_complex {
                debug!(
                    sub_queries = decomposition.sub_queries.len(),
                    strategy = ?decomposition.strategy,
                    "routing as multi-hop"
                );
                let mut result = self
                    .multi_hop
                    .run_with_fusion(
                        &decomposition,
                        &self.config.multi_hop.options(),
                        &fusion_options,
                        cancel,
                    )
                    .await?;
                result.stats.decomposition_time = decomposition_time;
                result.stats.total_time += decomposition_time;
                return Ok(QueryOutcome::MultiHop(result));
            }
        }

        let output = self.pipeline.run(query, &fusion_options, cancel).await?;
        Ok(QueryOutcome::SingleHop {
            routing: output.routing,
            fused: output.fused,
        })
    }

    pub async fn classify(&self, query: &str, cancel: &CancellationToken) -> ClassificationResult {
        self.pipeline.classifier().classify(query, cancel).await
    }

    pub async fn route(
        &self,
        query: &str,
        classification: &ClassificationResult,
        cancel: &CancellationToken,
    ) -> RoutingResult {
        self.pipeline.router().route(query, classification, cancel).await
    }

    pub fn fuse(
        &self,
        layer_results: &[LayerResult],
        options: &FusionOptions,
    ) -> StrataResult<FusedResult> {
        self.pipeline.fusion().fuse(layer_results, options)
    }

    pub async fn decompose(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> StrataResult<DecompositionResult> {
        self.decomposer
            .decompose(query, &self.config.decomposition.options(), cancel)
            .await
    }

    pub async fn run_multi_hop(
        &self,
        decomposition: &DecompositionResult,
        cancel: &CancellationToken,
    ) -> StrataResult<MultiHopResult> {
        self.multi_hop
            .run(decomposition, &self.config.multi_hop.options(), cancel)
            .await
    }

    pub fn combine(&self, hops: &[HopResult]) -> StrataResult<CombinedContext> {
        self.multi_hop
            .combiner()
            .combine(hops, &self.config.combiner)
    }
}

/// Drive `fut` to completion. If `deadline` passes first, cancel `token` and keep
/// driving so the caller still gets the partial result.
async fn with_deadline<F: Future>(
    fut: F,
    deadline: Option<Duration>,
    token: &CancellationToken,
) -> F::Output {
    let Some(deadline) = deadline else {
        return fut.await;
    };
    tokio::pin!(fut);
    tokio::select! {
        out = &mut fut => return out,
        _ = tokio::time::sleep(deadline) => {
            debug!(deadline_ms = deadline.as_millis() as u64, "query deadline reached");
            token.cancel();
        }
    }
    fut.await
}
