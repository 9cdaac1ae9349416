use std::sync::Arc;
use std::time::Duration;

use hrp_config::WebSearchConfig;
use hrp_limits::BreakerRegistry;

use crate::provider::SearchProvider;
use crate::types::WebResult;

const SERVICE: &str = "web_search";
const MIN_SNIPPET_LEN: usize = 20;
const MAX_QUERY_LEN: usize = 500;

/// Web Searcher (C7): tries configured providers in order, first one to
/// return usable content wins. Falls back to a synthetic search-suggestion
/// result when every provider comes back empty.
pub struct WebSearcher {
    providers: Vec<Arc<dyn SearchProvider>>,
    breakers: Arc<BreakerRegistry>,
    overall_timeout: Duration,
    provider_timeout: Duration,
    max_retries: u32,
    canonical_search_url: String,
}

impl WebSearcher {
    pub fn new(
        providers: Vec<Arc<dyn SearchProvider>>,
        breakers: Arc<BreakerRegistry>,
        config: &WebSearchConfig,
        canonical_search_url: impl Into<String>,
    ) -> Self {
        Self {
            providers,
            breakers,
            overall_timeout: Duration::from_secs(config.timeout_secs),
            provider_timeout: Duration::from_secs(config.provider_timeout_secs),
            max_retries: config.max_retries,
            canonical_search_url: canonical_search_url.into(),
        }
    }

    pub async fn search(&self, query: &str, n: usize) -> Vec<WebResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let query: String = query.chars().take(MAX_QUERY_LEN).collect();
        let n = n.clamp(1, 10);

        if !self.breakers.allow(SERVICE) {
            tracing::warn!(service = SERVICE, "breaker open, skipping web search");
            return Vec::new();
        }

        match tokio::time::timeout(self.overall_timeout, self.try_all_providers(&query, n)).await {
            Ok(results) => results,
            Err(_) => {
                tracing::warn!(
                    query = %query,
                    timeout_ms = self.overall_timeout.as_millis(),
                    "web search exceeded overall deadline"
                );
                Vec::new()
            }
        }
    }

    async fn try_all_providers(&self, query: &str, n: usize) -> Vec<WebResult> {
        for provider in &self.providers {
            if let Some(results) = self.try_provider(provider.as_ref(), query, n).await {
                self.breakers.record_success(SERVICE);
                return results;
            }
        }

        tracing::info!(query = %query, "all web search providers empty, returning suggestion");
        vec![WebResult::suggestion(query, &self.canonical_search_url)]
    }

    /// Runs one provider to completion, retrying transient timeouts and
    /// errors up to `max_retries` times. Returns `None` when the provider
    /// legitimately has nothing (empty or too-short results) or when
    /// retries are exhausted; a `None` from exhaustion records a breaker
    /// failure, a `None` from genuinely empty results does not (§4.7).
    async fn try_provider(&self, provider: &dyn SearchProvider, query: &str, n: usize) -> Option<Vec<WebResult>> {
        let mut attempt = 0;
        loop {
            match tokio::time::timeout(self.provider_timeout, provider.search(query, n)).await {
                Ok(Ok(results)) => {
                    let usable: Vec<WebResult> = results
                        .into_iter()
                        .filter(|r| r.snippet.len() > MIN_SNIPPET_LEN)
                        .collect();
                    return if usable.is_empty() { None } else { Some(usable) };
                }
                Ok(Err(err)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(provider = provider.name(), error = %err, attempt, "provider error, retrying");
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Ok(Err(err)) => {
                    tracing::warn!(provider = provider.name(), error = %err, "provider failed, retries exhausted");
                    self.breakers.record_failure(SERVICE);
                    return None;
                }
                Err(_) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(provider = provider.name(), attempt, "provider timed out, retrying");
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(_) => {
                    tracing::warn!(provider = provider.name(), "provider timed out, retries exhausted");
                    self.breakers.record_failure(SERVICE);
                    return None;
                }
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(200 * attempt as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hrp_config::BreakerConfig;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn result(snippet: &str) -> WebResult {
        WebResult {
            title: "t".into(),
            snippet: snippet.into(),
            url: "https://example.com".into(),
            is_suggestion: false,
        }
    }

    fn config() -> WebSearchConfig {
        WebSearchConfig {
            timeout_secs: 5,
            provider_timeout_secs: 1,
            max_retries: 2,
            providers: vec![],
        }
    }

    fn breakers() -> Arc<BreakerRegistry> {
        Arc::new(BreakerRegistry::new(BreakerConfig { threshold: 3, cooldown_secs: 300 }))
    }

    struct FixedProvider {
        name: &'static str,
        results: Vec<WebResult>,
    }

    #[async_trait]
    impl SearchProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(&self, _query: &str, _n: usize) -> anyhow::Result<Vec<WebResult>> {
            Ok(self.results.clone())
        }
    }

    struct FailThenSucceed {
        calls: AtomicU32,
        fail_times: u32,
    }

    #[async_trait]
    impl SearchProvider for FailThenSucceed {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn search(&self, _query: &str, _n: usize) -> anyhow::Result<Vec<WebResult>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_times {
                anyhow::bail!("connection reset");
            }
            Ok(vec![result("a result with plenty of content in it")])
        }
    }

    struct AlwaysEmpty;

    #[async_trait]
    impl SearchProvider for AlwaysEmpty {
        fn name(&self) -> &str {
            "empty"
        }

        async fn search(&self, _query: &str, _n: usize) -> anyhow::Result<Vec<WebResult>> {
            Ok(vec![])
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl SearchProvider for AlwaysFails {
        fn name(&self) -> &str {
            "broken"
        }

        async fn search(&self, _query: &str, _n: usize) -> anyhow::Result<Vec<WebResult>> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn empty_query_returns_empty_list() {
        let searcher = WebSearcher::new(vec![], breakers(), &config(), "https://duckduckgo.com/?q=");
        assert!(searcher.search("   ", 3).await.is_empty());
    }

    #[tokio::test]
    async fn first_usable_provider_wins() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(FixedProvider { name: "first", results: vec![result("a solid chunk of usable content")] }),
            Arc::new(FixedProvider { name: "second", results: vec![result("a solid chunk of usable content")] }),
        ];
        let reg = breakers();
        let searcher = WebSearcher::new(providers, reg.clone(), &config(), "https://duckduckgo.com/?q=");
        let results = searcher.search("query", 3).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_suggestion);
        assert_eq!(reg.snapshot(SERVICE).failures, 0);
    }

    #[tokio::test]
    async fn short_snippets_are_filtered_and_next_provider_is_tried() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(FixedProvider { name: "thin", results: vec![result("too short")] }),
            Arc::new(FixedProvider { name: "good", results: vec![result("a solid chunk of usable content")] }),
        ];
        let searcher = WebSearcher::new(providers, breakers(), &config(), "https://duckduckgo.com/?q=");
        let results = searcher.search("query", 3).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn all_providers_empty_yields_suggestion_without_breaker_failure() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(AlwaysEmpty), Arc::new(AlwaysEmpty)];
        let reg = breakers();
        let searcher = WebSearcher::new(providers, reg.clone(), &config(), "https://duckduckgo.com/?q=");
        let results = searcher.search("rust ownership", 3).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_suggestion);
        assert!(results[0].url.contains("rust%20ownership") || results[0].url.contains("rust+ownership"));
        assert_eq!(reg.snapshot(SERVICE).failures, 0);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_and_then_succeeds() {
        let provider: Arc<dyn SearchProvider> = Arc::new(FailThenSucceed { calls: AtomicU32::new(0), fail_times: 1 });
        let reg = breakers();
        let searcher = WebSearcher::new(vec![provider], reg.clone(), &config(), "https://duckduckgo.com/?q=");
        let results = searcher.search("query", 3).await;
        assert_eq!(results.len(), 1);
        assert_eq!(reg.snapshot(SERVICE).failures, 0);
    }

    #[tokio::test]
    async fn exhausted_retries_record_breaker_failure_and_fall_through() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(AlwaysFails)];
        let reg = breakers();
        let searcher = WebSearcher::new(providers, reg.clone(), &config(), "https://duckduckgo.com/?q=");
        let results = searcher.search("query", 3).await;
        assert!(results[0].is_suggestion);
        assert_eq!(reg.snapshot(SERVICE).failures, 1);
    }

    #[tokio::test]
    async fn open_breaker_skips_search_entirely() {
        let providers: Vec<Arc<dyn SearchProvider>> =
            vec![Arc::new(FixedProvider { name: "first", results: vec![result("a solid chunk of usable content")] })];
        let reg = breakers();
        reg.record_failure(SERVICE);
        reg.record_failure(SERVICE);
        reg.record_failure(SERVICE);
        let searcher = WebSearcher::new(providers, reg, &config(), "https://duckduckgo.com/?q=");
        let results = searcher.search("query", 3).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn n_is_clamped_into_range() {
        let providers: Vec<Arc<dyn SearchProvider>> =
            vec![Arc::new(FixedProvider { name: "first", results: vec![result("a solid chunk of usable content")] })];
        let searcher = WebSearcher::new(providers, breakers(), &config(), "https://duckduckgo.com/?q=");
        let results = searcher.search("query", 0).await;
        assert_eq!(results.len(), 1);
    }
}
