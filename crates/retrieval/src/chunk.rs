use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a chunk's content came from. `Other` is an escape hatch so metadata
/// produced by a store that predates a given tag is carried through rather
/// than dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceType {
    File,
    Url,
    Domain(String),
    Override,
    Other(String, String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub source_type: SourceType,
    pub is_override: bool,
    pub priority: i32,
    pub timestamp: DateTime<Utc>,
    /// The domain this chunk was tagged with at ingestion time, if any.
    /// `None` means the chunk is domain-agnostic (applies everywhere).
    pub domain_tag: Option<String>,
}

/// A single retrieved piece of knowledge. Produced only by the retriever;
/// read-only to every downstream component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Similarity distance — non-negative, smaller means closer.
    pub distance: f32,
}

impl Chunk {
    /// Regular-chunk domain gate: the chunk's source type tag must be one
    /// of the domain's declared `source_type_tags`.
    pub fn matches_domain_tags(&self, tags: &[String]) -> bool {
        match &self.metadata.source_type {
            SourceType::Domain(name) => tags.iter().any(|t| t == name),
            _ => false,
        }
    }

    /// Override-chunk domain gate: applies iff the chunk's domain tag
    /// matches the target domain, or it carries no domain tag at all.
    pub fn override_applies_to_domain(&self, domain_name: &str) -> bool {
        match &self.metadata.domain_tag {
            Some(tag) => tag == domain_name,
            None => true,
        }
    }
}
