use async_trait::async_trait;

use crate::errors::InferenceError;

/// External inference service that returns JSON constrained to a schema.
///
/// The returned value is *not* trusted: callers validate it against their own
/// types and treat any mismatch as a schema violation.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    fn name(&self) -> &str;

    async fn complete_json(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, InferenceError>;
}
