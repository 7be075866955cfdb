//! Sub-query dependency graph: validation, strategy selection, and wave planning.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use strata_core::errors::DecompositionError;
use strata_core::models::{DecompositionResult, ExecutionStrategy, SubQuery};

/// Check ids and dependencies, and that the graph is acyclic with every
/// dependency declared before its dependent.
pub fn validate(sub_queries: &[SubQuery]) -> Result<(), DecompositionError> {
    if sub_queries.is_empty() {
        return Err(DecompositionError::Empty);
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, sq) in sub_queries.iter().enumerate() {
        if index.insert(sq.id.as_str(), i).is_some() {
            return Err(DecompositionError::DuplicateId { id: sq.id.clone() });
        }
    }
    for sq in sub_queries {
        for dep in &sq.dependencies {
            if !index.contains_key(dep.as_str()) {
                return Err(DecompositionError::UnknownDependency {
                    sub_query: sq.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    topological_order(sub_queries)?;

    for (i, sq) in sub_queries.iter().enumerate() {
        for dep in &sq.dependencies {
            if index.get(dep.as_str()).is_some_and(|&d| d >= i) {
                return Err(DecompositionError::ForwardDependency {
                    sub_query: sq.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Kahn's algorithm. Among ready sub-queries the higher priority goes first, then
/// the earlier declared.
pub fn topological_order(sub_queries: &[SubQuery]) -> Result<Vec<usize>, DecompositionError> {
    let index: HashMap<&str, usize> = sub_queries
        .iter()
        .enumerate()
        .map(|(i, sq)| (sq.id.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; sub_queries.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); sub_queries.len()];
    for (i, sq) in sub_queries.iter().enumerate() {
        let deps: HashSet<usize> = sq
            .dependencies
            .iter()
            .filter_map(|d| index.get(d.as_str()).copied())
            .collect();
        for d in deps {
            dependents[d].push(i);
            in_degree[i] += 1;
        }
    }

    let mut ready: BinaryHeap<(u32, Reverse<usize>)> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &deg)| deg == 0)
        .map(|(i, _)| (sub_queries[i].priority, Reverse(i)))
        .collect();

    let mut sorted = Vec::with_capacity(sub_queries.len());
    while let Some((_, Reverse(node))) = ready.pop() {
        sorted.push(node);
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push((sub_queries[next].priority, Reverse(next)));
            }
        }
    }

    if sorted.len() != sub_queries.len() {
        let involving = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg > 0)
            .map(|(i, _)| sub_queries[i].id.clone())
            .collect();
        return Err(DecompositionError::Cycle { involving });
    }
    Ok(sorted)
}

/// No edges → parallel; every sub-query depending on exactly its predecessor →
/// sequential; anything else → hybrid.
pub fn strategy_for(sub_queries: &[SubQuery]) -> ExecutionStrategy {
    if sub_queries.iter().all(|sq| sq.dependencies.is_empty()) {
        return if sub_queries.len() <= 1 {
            ExecutionStrategy::Sequential
        } else {
            ExecutionStrategy::Parallel
        };
    }
    let is_chain = sub_queries.iter().enumerate().all(|(i, sq)| match i {
        0 => sq.dependencies.is_empty(),
        _ => sq.dependencies.len() == 1 && sq.dependencies[0] == sub_queries[i - 1].id,
    });
    if is_chain {
        ExecutionStrategy::Sequential
    } else {
        ExecutionStrategy::Hybrid
    }
}

/// Dependency level of each sub-query: 0 without dependencies, otherwise one more
/// than its deepest dependency.
pub fn levels(sub_queries: &[SubQuery]) -> Result<Vec<usize>, DecompositionError> {
    let order = topological_order(sub_queries)?;
    let index: HashMap<&str, usize> = sub_queries
        .iter()
        .enumerate()
        .map(|(i, sq)| (sq.id.as_str(), i))
        .collect();

    let mut level = vec![0usize; sub_queries.len()];
    for i in order {
        level[i] = sub_queries[i]
            .dependencies
            .iter()
            .filter_map(|d| index.get(d.as_str()))
            .map(|&d| level[d] + 1)
            .max()
            .unwrap_or(0);
    }
    Ok(level)
}

/// Execution waves as sub-query indices. Waves run in order; members of a wave
/// run concurrently.
pub fn plan_waves(decomposition: &DecompositionResult) -> Result<Vec<Vec<usize>>, DecompositionError> {
    let sub_queries = &decomposition.sub_queries;
    validate(sub_queries)?;

    let by_priority = |a: &usize, b: &usize| {
        sub_queries[*b]
            .priority
            .cmp(&sub_queries[*a].priority)
            .then(a.cmp(b))
    };

    match decomposition.strategy {
        ExecutionStrategy::Sequential => Ok(topological_order(sub_queries)?
            .into_iter()
            .map(|i| vec![i])
            .collect()),
        ExecutionStrategy::Parallel if !decomposition.has_dependencies() => {
            let mut wave: Vec<usize> = (0..sub_queries.len()).collect();
            wave.sort_by(by_priority);
            Ok(vec![wave])
        }
        // Parallel with dependencies cannot run as one wave; use levels.
        ExecutionStrategy::Parallel | ExecutionStrategy::Hybrid => {
            let level = levels(sub_queries)?;
            let depth = level.iter().copied().max().unwrap_or(0) + 1;
            let mut waves: Vec<Vec<usize>> = vec![Vec::new(); depth];
            for (i, &l) in level.iter().enumerate() {
                waves[l].push(i);
            }
            for wave in &mut waves {
                wave.sort_by(by_priority);
            }
            Ok(waves)
        }
    }
}
