use async_trait::async_trait;

use crate::chunk::Chunk;

/// Similarity-search backend. The embedding function lives behind this
/// trait — the retriever itself never embeds inline, it only asks for
/// nearest neighbours of already-indexed text.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn search(&self, query_text: &str, n: usize) -> anyhow::Result<Vec<Chunk>>;
}
