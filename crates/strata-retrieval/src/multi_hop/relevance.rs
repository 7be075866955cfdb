//! Hop relevance: how well a hop's context covers what its sub-query asked for.
//! Independent of fusion scores.

use std::collections::HashSet;

use strata_core::models::FusedItem;

use crate::decompose::indicators::is_action_verb;
use crate::text::{content_terms, token_set};

const COVERAGE_WEIGHT: f64 = 0.8;
const CONTINUITY_WEIGHT: f64 = 0.2;

/// Relevance in [0, 1].
///
/// Coverage is the fraction of the sub-query's content terms found in the hop's
/// context. With dependency context, continuity (fraction of hop items sharing a
/// term with that context) contributes 20%.
pub fn relevance_score(sub_query: &str, context: &[FusedItem], dependency_context: &[FusedItem]) -> f64 {
    if context.is_empty() {
        return 0.0;
    }

    let context_terms: HashSet<String> = context
        .iter()
        .flat_map(|item| token_set(&item.content))
        .collect();

    let terms: Vec<String> = content_terms(sub_query)
        .into_iter()
        .filter(|t| !is_action_verb(t))
        .collect();
    let coverage = if terms.is_empty() {
        // No content terms to look for.
        0.5
    } else {
        terms.iter().filter(|t| context_terms.contains(*t)).count() as f64 / terms.len() as f64
    };

    if dependency_context.is_empty() {
        return coverage.clamp(0.0, 1.0);
    }

    let dependency_terms: HashSet<String> = dependency_context
        .iter()
        .flat_map(|item| content_terms(&item.content))
        .collect();
    let continuing = context
        .iter()
        .filter(|item| {
            content_terms(&item.content)
                .iter()
                .any(|t| dependency_terms.contains(t))
        })
        .count();
    let continuity = continuing as f64 / context.len() as f64;

    (COVERAGE_WEIGHT * coverage + CONTINUITY_WEIGHT * continuity).clamp(0.0, 1.0)
}
