//! Concrete [`LlmProvider`] implementations. Grounded in the teacher's
//! `OllamaClient`/`OpenRouterClient` (`examples/danielmriley-aigent/crates/llm/src/lib.rs`):
//! base URL from an environment variable, a bare `reqwest::Client`, and
//! JSON field picking rather than a generated SDK client.

use serde_json::json;

use async_trait::async_trait;

use crate::params::GenerationParams;
use crate::provider::LlmProvider;

/// Talks to a local Ollama daemon's `/api/generate` endpoint.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(model: impl Into<String>) -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
        Self { client: reqwest::Client::new(), base_url, model: model.into() }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> anyhow::Result<String> {
        let endpoint = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": params.temperature,
                "num_predict": params.max_tokens,
            },
        });

        let response = self.client.post(endpoint).json(&payload).send().await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            anyhow::bail!("ollama error ({status}): {body}");
        }

        body.get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("ollama response missing text: {body}"))
    }
}

/// Talks to OpenRouter's OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), model: model.into() }
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> anyhow::Result<String> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("OPENROUTER_API_KEY not set"))?;

        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        let response = self
            .client
            .post("https://openrouter.ai/api/v1/chat/completions")
            .bearer_auth(api_key)
            .header("HTTP-Referer", "https://hybrid-response-pipeline.local")
            .header("X-Title", "Hybrid Response Pipeline")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            anyhow::bail!("openrouter error ({status}): {body}");
        }

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("openrouter response missing content: {body}"))
    }
}
