use std::sync::Arc;
use std::time::Duration;

use hrp_config::DomainConfig;
use hrp_limits::BreakerRegistry;

use crate::chunk::Chunk;
use crate::store::VectorStore;

const SERVICE: &str = "rag_search";

/// RAG Retriever (C5): domain-filtered similarity search with priority
/// boosting and override-chunk surfacing.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    breakers: Arc<BreakerRegistry>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, breakers: Arc<BreakerRegistry>) -> Self {
        Self { store, breakers }
    }

    /// Returns up to `k` chunks, overrides first, in ascending distance
    /// order within each partition. Any backend failure — breaker-open,
    /// error, or deadline exceeded — yields an empty list rather than
    /// surfacing an error; the breaker absorbs the signal instead.
    pub async fn retrieve(
        &self,
        query_text: &str,
        domain_filter: Option<&DomainConfig>,
        k: usize,
        deadline: Duration,
    ) -> Vec<Chunk> {
        if !self.breakers.allow(SERVICE) {
            tracing::warn!(service = SERVICE, "breaker open, skipping retrieval");
            return Vec::new();
        }

        let n = k.saturating_mul(3).max(1);
        let result = tokio::time::timeout(deadline, self.store.search(query_text, n)).await;

        let chunks = match result {
            Ok(Ok(chunks)) => {
                self.breakers.record_success(SERVICE);
                chunks
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "rag backend returned an error");
                self.breakers.record_failure(SERVICE);
                return Vec::new();
            }
            Err(_) => {
                tracing::warn!(timeout_ms = deadline.as_millis(), "rag backend search timed out");
                self.breakers.record_failure(SERVICE);
                return Vec::new();
            }
        };

        let (mut overrides, mut regular): (Vec<Chunk>, Vec<Chunk>) =
            chunks.into_iter().partition(|c| c.metadata.is_override);

        if let Some(domain) = domain_filter {
            overrides.retain(|c| c.override_applies_to_domain(&domain.name));
            regular.retain(|c| c.matches_domain_tags(&domain.source_type_tags));
        }

        let boost = domain_filter.map(|d| d.priority_boost).filter(|b| *b > 0.0);
        if let Some(boost) = boost {
            for chunk in overrides.iter_mut().chain(regular.iter_mut()) {
                chunk.distance /= boost;
            }
        }

        overrides.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        regular.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        overrides.into_iter().chain(regular).take(k).collect()
    }
}
