//! Memory module - domain types for the persistent memory store.
//!
//! A [`Memory`] is the primary unit of storage and retrieval, scoped to
//! an owner and optionally grouped into a [`Context`]. [`Relation`]s form
//! a lightweight knowledge graph between memories owned by the same user.

mod types;

pub use types::{
    AccessLevel, Chunk, Codec, Context, CreateContextInput, CreateMemoryInput,
    CreateRelationInput, Memory, Relation, ScoredMemory, SearchQuery, SemanticSearchQuery,
    UpdateMemoryInput, User,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate statistics returned by `get_memory_statistics`.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_memories: i64,
    pub active_memories: i64,
    pub total_contexts: i64,
    pub total_relations: i64,
    pub average_importance: f64,
    pub oldest_memory: Option<DateTime<Utc>>,
    pub newest_memory: Option<DateTime<Utc>>,
    pub memories_with_embeddings: i64,
}

impl Default for MemoryStats {
    fn default() -> Self {
        Self {
            total_memories: 0,
            active_memories: 0,
            total_contexts: 0,
            total_relations: 0,
            average_importance: 0.0,
            oldest_memory: None,
            newest_memory: None,
            memories_with_embeddings: 0,
        }
    }
}
