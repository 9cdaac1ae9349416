use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use hrp_retrieval::{Chunk, ChunkMetadata, SourceType, VectorStore};

/// Demonstration [`VectorStore`]: loads a flat JSON array of documents at
/// startup and scores matches by keyword overlap instead of embeddings.
/// Standing in for a real vector backend in this harness only — the
/// pipeline itself never assumes a particular retrieval implementation.
pub struct JsonFileStore {
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    id: String,
    content: String,
    source: String,
    #[serde(default)]
    domain_tag: Option<String>,
    #[serde(default)]
    is_override: bool,
    #[serde(default)]
    priority: i32,
}

impl JsonFileStore {
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let documents: Vec<Document> = serde_json::from_str(&raw)?;
        Ok(Self { documents })
    }

    pub fn empty() -> Self {
        Self { documents: Vec::new() }
    }
}

#[async_trait]
impl VectorStore for JsonFileStore {
    async fn search(&self, query_text: &str, n: usize) -> Result<Vec<Chunk>> {
        let query_words: Vec<String> = query_text.to_lowercase().split_whitespace().map(str::to_string).collect();

        let mut scored: Vec<(f32, &Document)> = self
            .documents
            .iter()
            .map(|doc| {
                let content_lower = doc.content.to_lowercase();
                let overlap = query_words.iter().filter(|w| content_lower.contains(w.as_str())).count();
                let distance = 1.0 / (overlap as f32 + 1.0);
                (distance, doc)
            })
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(n)
            .map(|(distance, doc)| Chunk {
                id: doc.id.clone(),
                content: doc.content.clone(),
                distance,
                metadata: ChunkMetadata {
                    source: doc.source.clone(),
                    source_type: if doc.is_override {
                        SourceType::Override
                    } else {
                        doc.domain_tag.clone().map(SourceType::Domain).unwrap_or(SourceType::File)
                    },
                    is_override: doc.is_override,
                    priority: doc.priority,
                    timestamp: chrono::Utc::now(),
                    domain_tag: doc.domain_tag.clone(),
                },
            })
            .collect())
    }
}
