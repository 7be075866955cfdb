/// Estimates the token cost of a piece of context.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;

    fn name(&self) -> &'static str;
}
