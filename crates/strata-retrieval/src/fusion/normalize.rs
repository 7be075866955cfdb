//! Per-layer score normalization into [0, 1].

/// Normalize one layer's raw scores.
///
/// Scores already inside [0, 1] are kept as the layer reported them. Anything else
/// is min-max scaled; a flat out-of-range layer maps every item to 1.0.
pub fn normalize_scores(scores: &[f64]) -> Vec<f64> {
    if scores.iter().all(|s| (0.0..=1.0).contains(s)) {
        return scores.to_vec();
    }

    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= f64::EPSILON {
        return vec![1.0; scores.len()];
    }
    scores.iter().map(|s| (s - min) / range).collect()
}
