//! Query decomposition: compound request → dependency DAG of sub-queries.
//!
//! Rule splitting runs first. Inference is consulted only when the indicators cross
//! the threshold but the rules found fewer than two clauses. Any malformed graph
//! degrades to a single pass-through sub-query.

pub mod graph;
pub mod indicators;
pub mod inference_split;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use strata_core::errors::{DecompositionError, StrataError, StrataResult};
use strata_core::models::{DecompositionOptions, DecompositionResult, SubQuery};
use strata_core::traits::InferenceClient;
use strata_observability::decomposition_span;
use strata_observability::tracing_setup::events;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::inference::complete_bounded;
use indicators::{has_anaphora, is_foundational, mentions_follow_up, subject_terms};

/// Priority: foundational clauses first, then independent ones, then dependents.
pub fn priority_for(text: &str, independent: bool) -> u32 {
    if is_foundational(text) {
        2
    } else if independent {
        1
    } else {
        0
    }
}

enum RulePass {
    Done(DecompositionResult),
    NeedsSplit { indicators: usize },
}

#[derive(Default)]
pub struct QueryDecomposer {
    inference: Option<Arc<dyn InferenceClient>>,
    inference_timeout: Duration,
}

impl QueryDecomposer {
    /// Rules only.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inference(mut self, client: Arc<dyn InferenceClient>, timeout: Duration) -> Self {
        self.inference = Some(client);
        self.inference_timeout = timeout;
        self
    }

    pub async fn decompose(
        &self,
        query: &str,
        options: &DecompositionOptions,
        cancel: &CancellationToken,
    ) -> StrataResult<DecompositionResult> {
        let span = decomposition_span!(query);
        self.decompose_inner(query, options, cancel)
            .instrument(span)
            .await
    }

    async fn decompose_inner(
        &self,
        query: &str,
        options: &DecompositionOptions,
        cancel: &CancellationToken,
    ) -> StrataResult<DecompositionResult> {
        let indicators = match rule_pass(query, options)? {
            RulePass::Done(result) => return Ok(result),
            RulePass::NeedsSplit { indicators } => indicators,
        };

        let Some(client) = &self.inference else {
            return Ok(DecompositionResult::simple(
                query,
                indicators,
                "complex query, but no clause boundaries found and no inference available",
            ));
        };

        let split = complete_bounded(
            client.as_ref(),
            &inference_split::split_prompt(query, options.max_sub_queries),
            &inference_split::split_schema(),
            self.inference_timeout,
            cancel,
        )
        .await
        .map_err(DecompositionError::from)
        .and_then(|value| inference_split::parse_split(value, options.max_sub_queries));

        match split {
            Ok(sub_queries) => Ok(finish(
                query,
                sub_queries,
                indicators,
                format!("{indicators} complexity indicators; split by inference"),
            )),
            Err(e) => {
                events::decomposition_fallback(query, &e.to_string());
                Ok(DecompositionResult::simple(
                    query,
                    indicators,
                    format!("inference split failed: {e}"),
                ))
            }
        }
    }
}

/// Decompose with the rule splitter alone.
pub fn decompose_with_rules(
    query: &str,
    options: &DecompositionOptions,
) -> StrataResult<DecompositionResult> {
    Ok(match rule_pass(query, options)? {
        RulePass::Done(result) => result,
        RulePass::NeedsSplit { indicators } => DecompositionResult::simple(
            query,
            indicators,
            "complex query, but no clause boundaries found",
        ),
    })
}

fn rule_pass(query: &str, options: &DecompositionOptions) -> StrataResult<RulePass> {
    options.validate()?;
    if query.trim().is_empty() {
        return Err(StrataError::invalid_input("query must not be empty"));
    }

    let report = indicators::analyze(query);
    debug!(
        indicators = report.indicators,
        clauses = report.clauses.len(),
        "complexity analysis"
    );

    if report.indicators < options.min_complexity_indicators {
        return Ok(RulePass::Done(DecompositionResult::simple(
            query,
            report.indicators,
            format!(
                "{} complexity indicators, below threshold {}",
                report.indicators, options.min_complexity_indicators
            ),
        )));
    }
    if report.clauses.len() < 2 {
        return Ok(RulePass::NeedsSplit {
            indicators: report.indicators,
        });
    }

    let clauses = merge_surplus(report.clauses, options.max_sub_queries);
    let sub_queries = link_clauses(&clauses);
    Ok(RulePass::Done(finish(
        query,
        sub_queries,
        report.indicators,
        format!(
            "{} complexity indicators; split into {} clauses",
            report.indicators,
            clauses.len()
        ),
    )))
}

/// Fold clauses past `max` into the last kept one.
fn merge_surplus(mut clauses: Vec<String>, max: usize) -> Vec<String> {
    let max = max.max(1);
    if clauses.len() > max {
        let tail = clauses.split_off(max - 1).join(", ");
        clauses.push(tail);
    }
    clauses
}

/// Build sub-queries and their dependency edges from ordered clauses.
///
/// A clause depends on:
/// - the previous clause, when it refers back with a pronoun ("write tests for it");
/// - the nearest earlier foundational clause, when it asks for a follow-up artifact
///   (tests, docs, release) or names that clause's subject.
pub fn link_clauses(clauses: &[String]) -> Vec<SubQuery> {
    let subjects: Vec<BTreeSet<String>> = clauses.iter().map(|c| subject_terms(c)).collect();

    clauses
        .iter()
        .enumerate()
        .map(|(i, clause)| {
            let mut deps: BTreeSet<usize> = BTreeSet::new();
            if i > 0 && has_anaphora(clause) {
                deps.insert(i - 1);
            }
            let nearest_foundational = (0..i).rev().find(|&j| is_foundational(&clauses[j]));
            if let Some(j) = nearest_foundational {
                if mentions_follow_up(clause) {
                    deps.insert(j);
                }
            }
            if let Some(j) = (0..i)
                .rev()
                .find(|&j| is_foundational(&clauses[j]) && !subjects[j].is_disjoint(&subjects[i]))
            {
                deps.insert(j);
            }

            let dependencies: Vec<String> = deps.iter().map(|d| format!("sq-{d}")).collect();
            SubQuery {
                id: format!("sq-{i}"),
                text: clause.clone(),
                priority: priority_for(clause, dependencies.is_empty()),
                dependencies,
            }
        })
        .collect()
}

/// Validate and wrap sub-queries; anything malformed degrades to a single hop.
fn finish(
    query: &str,
    sub_queries: Vec<SubQuery>,
    indicators: usize,
    reasoning: String,
) -> DecompositionResult {
    if let Err(e) = graph::validate(&sub_queries) {
        events::decomposition_fallback(query, &e.to_string());
        return DecompositionResult::simple(query, indicators, format!("invalid decomposition: {e}"));
    }
    if sub_queries.len() < 2 {
        return DecompositionResult::simple(query, indicators, reasoning);
    }
    DecompositionResult {
        is_complex: true,
        original_query: query.to_string(),
        strategy: graph::strategy_for(&sub_queries),
        sub_queries,
        reasoning,
        complexity_indicators: indicators,
    }
}
