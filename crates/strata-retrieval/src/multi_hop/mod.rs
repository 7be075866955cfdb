//! Multi-hop router: runs a decomposition's sub-queries wave by wave.
//!
//! Waves run strictly in order. Hops inside a wave share a `JoinSet` and a
//! semaphore sized to `max_concurrent_hops`. Each hop is a full single-hop
//! pipeline run on its own text. A hop that fails, exceeds `hop_timeout`, or
//! whose selected layers all fail is recorded with an error and the run carries
//! on. Partial layer failures stay visible on the hop and in the run stats.

pub mod relevance;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use strata_core::errors::{LayerError, StrataError, StrataResult};
use strata_core::models::{
    CombineOptions, DecompositionResult, FusedItem, FusionOptions, HopResult, MultiHopOptions,
    MultiHopResult, MultiHopStats,
};
use strata_observability::tracing_setup::events;
use strata_observability::{hop_span, wave_span};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::combine::ResultCombiner;
use crate::decompose::graph;
use crate::pipeline::{Pipeline, PipelineOutput};

pub use relevance::relevance_score;

/// What a hop task hands back to the wave loop.
struct HopRun {
    index: usize,
    started_at: Duration,
    completed_at: Duration,
    outcome: Result<PipelineOutput, String>,
    cancelled: bool,
}

pub struct MultiHopRouter {
    pipeline: Arc<Pipeline>,
    combiner: ResultCombiner,
    fusion_options: FusionOptions,
    combine_options: CombineOptions,
    pass_dependency_context: bool,
}

impl MultiHopRouter {
    pub fn new(pipeline: Arc<Pipeline>, combiner: ResultCombiner) -> Self {
        Self {
            pipeline,
            combiner,
            fusion_options: FusionOptions::default(),
            combine_options: CombineOptions::default(),
            pass_dependency_context: true,
        }
    }

    pub fn with_fusion_options(mut self, options: FusionOptions) -> Self {
        self.fusion_options = options;
        self
    }

    pub fn with_combine_options(mut self, options: CombineOptions) -> Self {
        self.combine_options = options;
        self
    }

    /// Whether dependent hops see their dependencies' context when scoring relevance.
    pub fn with_dependency_context(mut self, enabled: bool) -> Self {
        self.pass_dependency_context = enabled;
        self
    }

    pub fn combiner(&self) -> &ResultCombiner {
        &self.combiner
    }

    /// Execute every sub-query and combine the results.
    ///
    /// Returns one `HopResult` per sub-query in declaration order. A malformed graph
    /// or invalid options is the only error. Hops not started before cancellation
    /// are recorded as failed; in-flight hops keep whatever their layers delivered.
    pub async fn run(
        &self,
        decomposition: &DecompositionResult,
        options: &MultiHopOptions,
        cancel: &CancellationToken,
    ) -> StrataResult<MultiHopResult> {
        self.run_with_fusion(decomposition, options, &self.fusion_options, cancel)
            .await
    }

    /// [`run`](Self::run) with per-hop fusion options other than the configured ones.
    pub async fn run_with_fusion(
        &self,
        decomposition: &DecompositionResult,
        options: &MultiHopOptions,
        fusion_options: &FusionOptions,
        cancel: &CancellationToken,
    ) -> StrataResult<MultiHopResult> {
        options.validate()?;
        fusion_options.validate()?;
        let waves = graph::plan_waves(decomposition)?;
        let sub_queries = &decomposition.sub_queries;

        info!(
            sub_queries = sub_queries.len(),
            waves = waves.len(),
            strategy = ?decomposition.strategy,
            "multi-hop run starting"
        );

        let run_start = Instant::now();
        let index_of: HashMap<&str, usize> = sub_queries
            .iter()
            .enumerate()
            .map(|(i, sq)| (sq.id.as_str(), i))
            .collect();
        let mut hops: Vec<Option<HopResult>> = vec![None; sub_queries.len()];
        let semaphore = Arc::new(Semaphore::new(options.max_concurrent_hops));

        for (wave_index, wave) in waves.iter().enumerate() {
            let span = wave_span!(wave_index, wave.len());
            let runs = self
                .run_wave(
                    decomposition,
                    wave,
                    wave_index,
                    options,
                    *fusion_options,
                    &semaphore,
                    run_start,
                    cancel,
                )
                .instrument(span)
                .await;

            for run in runs {
                let sub_query = &sub_queries[run.index];
                let hop = match run.outcome {
                    Ok(PipelineOutput { routing, fused }) => {
                        let dependency_context: Vec<FusedItem> = if self.pass_dependency_context {
                            sub_query
                                .dependencies
                                .iter()
                                .filter_map(|d| index_of.get(d.as_str()))
                                .filter_map(|&d| hops[d].as_ref())
                                .flat_map(|h| h.context.iter().cloned())
                                .collect()
                        } else {
                            Vec::new()
                        };
                        let relevance =
                            relevance_score(&sub_query.text, &fused.items, &dependency_context);
                        let layer_errors: Vec<LayerError> =
                            routing.layers.iter().filter_map(|l| l.error.clone()).collect();
                        let error = routing
                            .all_failed()
                            .then(|| format!("all {} layers failed", routing.layers.len()));
                        match &error {
                            Some(reason) => events::hop_failed(&sub_query.id, wave_index, reason),
                            None if !layer_errors.is_empty() || routing.stats.cancelled => debug!(
                                sub_query = %sub_query.id,
                                layers_failed = layer_errors.len(),
                                cancelled = routing.stats.cancelled,
                                "hop degraded"
                            ),
                            None => {}
                        }
                        HopResult {
                            sub_query_id: sub_query.id.clone(),
                            sub_query_text: sub_query.text.clone(),
                            layers_queried: routing.stats.layers_queried,
                            cancelled: routing.stats.cancelled,
                            classification: routing.classification,
                            context: fused.items,
                            relevance_score: relevance,
                            execution_time: run.completed_at.saturating_sub(run.started_at),
                            wave: wave_index,
                            started_at: run.started_at,
                            completed_at: run.completed_at,
                            layer_errors,
                            error,
                        }
                    }
                    Err(reason) => {
                        events::hop_failed(&sub_query.id, wave_index, &reason);
                        self.failed_hop(
                            decomposition,
                            run.index,
                            wave_index,
                            (run.started_at, run.completed_at),
                            reason,
                            run.cancelled,
                        )
                    }
                };
                hops[run.index] = Some(hop);
            }

            // A panicked hop task left nothing behind.
            for &index in wave {
                if hops[index].is_none() {
                    let reason = "hop task aborted".to_string();
                    events::hop_failed(&sub_queries[index].id, wave_index, &reason);
                    let now = run_start.elapsed();
                    hops[index] = Some(self.failed_hop(
                        decomposition,
                        index,
                        wave_index,
                        (now, now),
                        reason,
                        false,
                    ));
                }
            }
        }

        let execution_time = run_start.elapsed();
        // Every sub-query belongs to exactly one wave, so every slot is filled.
        let hops: Vec<HopResult> = hops.into_iter().flatten().collect();

        let combined = self.combiner.combine(&hops, &self.combine_options)?;

        let failed_hops = hops.iter().filter(|h| !h.is_success()).count();
        let cancelled_hops = hops.iter().filter(|h| h.cancelled).count();
        let layers_failed: usize = hops.iter().map(HopResult::layers_failed).sum();
        let total_context: usize = hops.iter().map(|h| h.context.len()).sum();
        let stats = MultiHopStats {
            total_hops: hops.len(),
            failed_hops,
            cancelled_hops,
            layers_failed,
            waves: waves.len(),
            total_time: run_start.elapsed(),
            decomposition_time: Duration::ZERO,
            execution_time,
            combination_time: combined.stats.combination_time,
            average_results_per_hop: if hops.is_empty() {
                0.0
            } else {
                total_context as f64 / hops.len() as f64
            },
            cross_hop_dedup_rate: combined.stats.cross_hop_dedup_rate,
            estimated_tokens: combined.stats.estimated_tokens,
        };

        info!(
            hops = stats.total_hops,
            failed = stats.failed_hops,
            layers_failed = stats.layers_failed,
            items = combined.items.len(),
            elapsed_ms = stats.total_time.as_millis() as u64,
            "multi-hop run complete"
        );

        Ok(MultiHopResult {
            decomposition: decomposition.clone(),
            hops,
            combined_context: combined.items,
            rendered_context: combined.rendered,
            stats,
        })
    }

    /// Run one wave's hops concurrently, bounded by the shared semaphore.
    #[allow(clippy::too_many_arguments)]
    async fn run_wave(
        &self,
        decomposition: &DecompositionResult,
        wave: &[usize],
        wave_index: usize,
        options: &MultiHopOptions,
        fusion_options: FusionOptions,
        semaphore: &Arc<Semaphore>,
        run_start: Instant,
        cancel: &CancellationToken,
    ) -> Vec<HopRun> {
        let mut join_set = JoinSet::new();
        let mut runs = Vec::with_capacity(wave.len());

        for &index in wave {
            let sub_query = &decomposition.sub_queries[index];
            if cancel.is_cancelled() {
                let now = run_start.elapsed();
                runs.push(HopRun {
                    index,
                    started_at: now,
                    completed_at: now,
                    outcome: Err("cancelled".to_string()),
                    cancelled: true,
                });
                continue;
            }

            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(semaphore);
            let text = sub_query.text.clone();
            let hop_timeout = options.hop_timeout;
            let hop_cancel = cancel.child_token();
            let span = hop_span!(sub_query.id, wave_index);

            join_set.spawn(
                async move {
                    // A closed semaphore only means the run is over; proceed unbounded.
                    let _permit = semaphore.acquire_owned().await.ok();
                    let started_at = run_start.elapsed();
                    let (outcome, cancelled) = match tokio::time::timeout(
                        hop_timeout,
                        pipeline.run(&text, &fusion_options, &hop_cancel),
                    )
                    .await
                    {
                        Ok(Ok(output)) => (Ok(output), false),
                        Ok(Err(StrataError::Cancelled)) => (Err("cancelled".to_string()), true),
                        Ok(Err(e)) => (Err(e.to_string()), false),
                        Err(_) => {
                            hop_cancel.cancel();
                            let reason = format!("timed out after {}ms", hop_timeout.as_millis());
                            (Err(reason), false)
                        }
                    };
                    HopRun {
                        index,
                        started_at,
                        completed_at: run_start.elapsed(),
                        outcome,
                        cancelled,
                    }
                }
                .instrument(span),
            );
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(run) => runs.push(run),
                Err(e) => warn!(wave = wave_index, error = %e, "hop task did not complete"),
            }
        }

        runs.sort_by_key(|r| r.index);
        debug!(wave = wave_index, hops = runs.len(), "wave complete");
        runs
    }

    fn failed_hop(
        &self,
        decomposition: &DecompositionResult,
        index: usize,
        wave: usize,
        (started_at, completed_at): (Duration, Duration),
        reason: String,
        cancelled: bool,
    ) -> HopResult {
        let sub_query = &decomposition.sub_queries[index];
        HopResult {
            sub_query_id: sub_query.id.clone(),
            sub_query_text: sub_query.text.clone(),
            classification: self
                .pipeline
                .classifier()
                .fallback(&sub_query.text, format!("hop failed: {reason}")),
            context: Vec::new(),
            relevance_score: 0.0,
            execution_time: completed_at.saturating_sub(started_at),
            wave,
            started_at,
            completed_at,
            layers_queried: 0,
            layer_errors: Vec::new(),
            cancelled,
            error: Some(reason),
        }
    }
}
