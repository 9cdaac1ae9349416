//! RAG Retriever (C5): domain-filtered similarity search over an injected
//! vector store, with override-chunk surfacing and priority boosting.

pub mod chunk;
pub mod retriever;
pub mod store;

pub use chunk::{Chunk, ChunkMetadata, SourceType};
pub use retriever::Retriever;
pub use store::VectorStore;
