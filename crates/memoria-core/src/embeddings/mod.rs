//! Embedding providers.
//!
//! Two implementations share the [`EmbeddingProvider`] trait: a
//! deterministic local provider that needs no model download or network
//! access, and a remote HTTP provider for callers who run their own
//! embedding service.

mod local;
mod remote;

pub use local::{cosine_similarity, Embedding, EmbeddingError, LocalEmbeddingProvider, EMBEDDING_DIMENSIONS};
pub use remote::RemoteEmbeddingProvider;

use async_trait::async_trait;

/// Produces fixed-dimension embedding vectors for text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;
    fn dimensions(&self) -> usize;
    /// Identifies which provider/version produced an embedding, so the
    /// background reindex worker can detect stale vectors after a
    /// provider change.
    fn provider_tag(&self) -> &'static str;
}
