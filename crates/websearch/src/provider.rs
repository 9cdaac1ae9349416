use async_trait::async_trait;

use crate::types::WebResult;

/// A single external search backend (§6: "the core consults these in a
/// configured order"). Implementations own their own HTTP client and
/// provider-specific request shape; the searcher only sees `WebResult`s.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable name used in logs and for the configured provider order
    /// (`WebSearchConfig::providers`).
    fn name(&self) -> &str;

    async fn search(&self, query: &str, n: usize) -> anyhow::Result<Vec<WebResult>>;
}
