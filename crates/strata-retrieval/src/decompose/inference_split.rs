//! Inference-backed query splitting, used when the indicators say "compound" but
//! the rule splitter could not find clause boundaries.

use std::collections::BTreeSet;

use serde::Deserialize;
use strata_core::errors::DecompositionError;
use strata_core::models::SubQuery;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SplitOutput {
    sub_queries: Vec<SplitItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SplitItem {
    text: String,
    #[serde(default)]
    depends_on: Vec<usize>,
}

pub fn split_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "sub_queries": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "text": { "type": "string" },
                        "depends_on": { "type": "array", "items": { "type": "integer", "minimum": 0 } }
                    },
                    "required": ["text"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["sub_queries"],
        "additionalProperties": false
    })
}

pub fn split_prompt(query: &str, max_sub_queries: usize) -> String {
    format!(
        "Split the developer request below into at most {max_sub_queries} self-contained \
         sub-requests, in execution order. For each, list the zero-based indices of earlier \
         sub-requests it needs results from in \"depends_on\".\n\n\
         Request: {query}"
    )
}

/// Validate raw inference output into sub-queries with `sq-N` ids.
///
/// Dependencies must point at strictly earlier entries. Entries past
/// `max_sub_queries` are merged into the last allowed one.
pub fn parse_split(
    value: serde_json::Value,
    max_sub_queries: usize,
) -> Result<Vec<SubQuery>, DecompositionError> {
    let output: SplitOutput =
        serde_json::from_value(value).map_err(|e| DecompositionError::SchemaViolation {
            reason: e.to_string(),
        })?;
    if output.sub_queries.is_empty() {
        return Err(DecompositionError::Empty);
    }

    let mut items = output.sub_queries;
    if items.iter().any(|i| i.text.trim().is_empty()) {
        return Err(DecompositionError::SchemaViolation {
            reason: "sub-query text must not be empty".to_string(),
        });
    }
    let limit = max_sub_queries.max(1);
    if items.len() > limit {
        let surplus: Vec<SplitItem> = items.drain(limit..).collect();
        if let Some(last) = items.last_mut() {
            for extra in surplus {
                last.text = format!("{}, {}", last.text.trim(), extra.text.trim());
                // References into the merged tail now point at `last` itself.
                last.depends_on
                    .extend(extra.depends_on.into_iter().filter(|&d| d + 1 < limit));
            }
        }
    }

    let mut sub_queries = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let id = format!("sq-{i}");
        let deps: BTreeSet<usize> = item.depends_on.into_iter().collect();
        let mut dependencies = Vec::with_capacity(deps.len());
        for d in deps {
            if d >= i {
                return Err(DecompositionError::ForwardDependency {
                    sub_query: id,
                    dependency: format!("sq-{d}"),
                });
            }
            dependencies.push(format!("sq-{d}"));
        }
        let text = item.text.trim().to_string();
        let priority = super::priority_for(&text, dependencies.is_empty());
        sub_queries.push(SubQuery {
            id,
            text,
            dependencies,
            priority,
        });
    }
    Ok(sub_queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_split_is_parsed() {
        let sqs = parse_split(
            json!({"sub_queries": [
                {"text": "implement rate limiting"},
                {"text": "document the limits", "depends_on": [0]}
            ]}),
            5,
        )
        .unwrap();
        assert_eq!(sqs.len(), 2);
        assert_eq!(sqs[1].dependencies, vec!["sq-0"]);
        assert!(sqs[0].priority > sqs[1].priority);
    }

    #[test]
    fn forward_dependency_is_rejected() {
        let err = parse_split(
            json!({"sub_queries": [{"text": "a", "depends_on": [1]}, {"text": "b"}]}),
            5,
        )
        .unwrap_err();
        assert!(matches!(err, DecompositionError::ForwardDependency { .. }));
    }

    #[test]
    fn wrong_shape_is_schema_violation() {
        let err = parse_split(json!({"parts": ["a", "b"]}), 5).unwrap_err();
        assert!(matches!(err, DecompositionError::SchemaViolation { .. }));
    }

    #[test]
    fn surplus_entries_merge_into_last() {
        let sqs = parse_split(
            json!({"sub_queries": [{"text": "a"}, {"text": "b"}, {"text": "c"}]}),
            2,
        )
        .unwrap();
        assert_eq!(sqs.len(), 2);
        assert_eq!(sqs[1].text, "b, c");
    }
}
