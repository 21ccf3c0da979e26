//! Core domain types: users, contexts, memories, relations, and the
//! input/patch structs used at the engine boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Visibility scope for a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Private,
    Shared,
    Public,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Private => "private",
            AccessLevel::Shared => "shared",
            AccessLevel::Public => "public",
        }
    }

    pub fn parse_name(name: &str) -> Option<Self> {
        match name {
            "private" => Some(AccessLevel::Private),
            "shared" => Some(AccessLevel::Shared),
            "public" => Some(AccessLevel::Public),
            _ => None,
        }
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Private
    }
}

/// Compression codec applied to a memory's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    None,
    Zstd,
    Adaptive,
}

impl Codec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::None => "none",
            Codec::Zstd => "zstd",
            Codec::Adaptive => "adaptive",
        }
    }

    pub fn parse_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Codec::None),
            "zstd" => Some(Codec::Zstd),
            "adaptive" => Some(Codec::Adaptive),
            _ => None,
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Codec::Adaptive
    }
}

/// A registered principal. Authentication lives in the server crate;
/// this is just the row the engine needs to scope ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A named grouping of memories belonging to one owner, e.g. a project
/// or conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One persisted chunk of an oversized memory's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub memory_id: String,
    pub sequence: i64,
    pub byte_len: i64,
}

/// A memory: the primary unit of storage and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Memory {
    pub id: String,
    pub owner_id: String,
    pub context_id: Option<String>,
    pub title: String,
    pub content: String,
    pub content_hash: String,
    pub access_level: AccessLevel,
    pub is_active: bool,
    pub importance: i32,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub codec: Codec,
    pub chunk_count: i64,
    /// Size of `content` before compression or chunking.
    pub original_byte_length: i64,
    /// Total bytes actually persisted (the compressed blob, or the sum
    /// of chunk byte lengths when chunked).
    pub stored_bytes_total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Memory {
    /// One of `inline`, `inline_compressed`, `chunked`, `chunked_compressed`,
    /// derived from whether this payload was split into chunk rows and
    /// whether a compression codec was applied.
    pub fn storage_mode(&self) -> &'static str {
        match (self.chunk_count > 0, self.codec != Codec::None) {
            (false, false) => "inline",
            (false, true) => "inline_compressed",
            (true, false) => "chunked",
            (true, true) => "chunked_compressed",
        }
    }
}

/// A directed, typed edge between two memories owned by the same user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: String,
    pub owner_id: String,
    pub source_id: String,
    pub target_id: String,
    pub relation_type: String,
    pub strength: f64,
    pub created_at: DateTime<Utc>,
}

/// Input accepted by `MemoryEngine::create_memory`.
///
/// `deny_unknown_fields` matches the engine's InvalidInput validation:
/// a caller that typos a field name gets a rejection, not a silent no-op.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateMemoryInput {
    pub owner_id: String,
    pub context_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default = "default_importance")]
    pub importance: i32,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_importance() -> i32 {
    5
}

/// Patch accepted by `MemoryEngine::update_memory`. Every field is
/// optional; omitted fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateMemoryInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub access_level: Option<AccessLevel>,
    pub importance: Option<i32>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub is_active: Option<bool>,
}

/// Input accepted by `MemoryEngine::create_context`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateContextInput {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Input accepted by `MemoryEngine::create_relation`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRelationInput {
    pub owner_id: String,
    pub source_id: String,
    pub target_id: String,
    pub relation_type: String,
    #[serde(default = "default_strength")]
    pub strength: f64,
}

fn default_strength() -> f64 {
    1.0
}

/// Keyword/filter search request for `search_memories`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchQuery {
    pub owner_id: String,
    pub query: Option<String>,
    pub context_id: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Semantic search request for `search_semantic`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SemanticSearchQuery {
    pub owner_id: String,
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    pub context_id: Option<String>,
    pub min_similarity: Option<f32>,
}

fn default_top_k() -> usize {
    10
}

/// A scored hit returned by `search_semantic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMemory {
    pub memory: Memory,
    pub similarity: f32,
}
