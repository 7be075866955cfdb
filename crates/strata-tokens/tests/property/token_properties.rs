use proptest::prelude::*;
use strata_core::traits::TokenEstimator;
use strata_tokens::{prefix_within, HeuristicEstimator, TokenCounter};

proptest! {
    #[test]
    fn cached_equals_uncached(s in ".{0,200}") {
        let counter = TokenCounter::new(64).unwrap();
        let uncached = counter.count(&s);
        let cached = counter.count_cached(&s);
        prop_assert_eq!(uncached, cached);
    }

    #[test]
    fn heuristic_is_subadditive_within_one(a in ".{0,100}", b in ".{0,100}") {
        let est = HeuristicEstimator::default();
        let combined = format!("{}{}", a, b);
        prop_assert!(est.estimate(&combined) <= est.estimate(&a) + est.estimate(&b));
        prop_assert!(est.estimate(&combined) + 1 >= est.estimate(&a) + est.estimate(&b));
    }

    #[test]
    fn prefix_never_exceeds_budget(costs in proptest::collection::vec(0usize..500, 0..60), budget in 0usize..5_000) {
        let taken = prefix_within(&costs, budget);
        let used: usize = costs[..taken].iter().sum();
        prop_assert!(used <= budget);
        if taken < costs.len() {
            prop_assert!(used + costs[taken] > budget);
        }
    }
}
