use async_trait::async_trait;

use crate::params::GenerationParams;

/// A single-shot text completion backend (§4.10). Implementations own their
/// own HTTP client; the client wrapper handles timeout, retry, and breaker
/// accounting uniformly across providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> anyhow::Result<String>;
}
