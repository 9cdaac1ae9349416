use std::sync::Arc;
use std::time::Duration;

use hrp_config::LlmConfig;
use hrp_limits::BreakerRegistry;

use crate::length::limit_length;
use crate::params::GenerationParams;
use crate::provider::LlmProvider;

const SERVICE: &str = "llm";

/// LLM Client (C10): wraps a provider with the pipeline's hard timeout,
/// retry-with-backoff, breaker accounting, and post-generation length
/// limiting (§4.10).
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    breakers: Arc<BreakerRegistry>,
    timeout: Duration,
    max_retries: u32,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn LlmProvider>, breakers: Arc<BreakerRegistry>, config: &LlmConfig) -> Self {
        Self {
            provider,
            breakers,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
        }
    }

    pub async fn generate(&self, prompt: &str, params: GenerationParams) -> anyhow::Result<String> {
        if !self.breakers.allow(SERVICE) {
            anyhow::bail!("llm breaker open, refusing to call provider");
        }

        let mut attempt = 0;
        loop {
            match tokio::time::timeout(self.timeout, self.provider.complete(prompt, &params)).await {
                Ok(Ok(text)) => {
                    self.breakers.record_success(SERVICE);
                    return Ok(limit_length(&text));
                }
                Ok(Err(err)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(provider = self.provider.name(), error = %err, attempt, "llm call failed, retrying");
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Ok(Err(err)) => {
                    self.breakers.record_failure(SERVICE);
                    return Err(err.context("llm call failed, retries exhausted"));
                }
                Err(_) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(provider = self.provider.name(), attempt, "llm call timed out, retrying");
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(_) => {
                    self.breakers.record_failure(SERVICE);
                    anyhow::bail!("llm call timed out after {} retries", self.max_retries);
                }
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(200 * attempt as u64)
}
