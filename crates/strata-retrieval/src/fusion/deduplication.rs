//! Near-duplicate removal by token-overlap (Jaccard) similarity.

use std::collections::HashSet;

use crate::text::{jaccard, token_set};

/// Drop items whose content is at least `threshold` similar to an item kept
/// before them. Input must be sorted best-first, so the highest-scoring
/// representative of each near-duplicate group survives.
///
/// Returns the kept items and the number removed.
pub fn deduplicate<T, F>(items: Vec<T>, content: F, threshold: f64) -> (Vec<T>, usize)
where
    F: Fn(&T) -> &str,
{
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    let mut kept_sets: Vec<HashSet<String>> = Vec::with_capacity(items.len());
    let mut removed = 0;

    for item in items {
        let set = token_set(content(&item));
        if kept_sets.iter().any(|k| jaccard(k, &set) >= threshold) {
            removed += 1;
            continue;
        }
        kept_sets.push(set);
        kept.push(item);
    }

    (kept, removed)
}
