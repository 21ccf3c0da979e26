//! memoria-core: a persistent memory store.
//!
//! This crate implements the storage, retrieval, and knowledge-graph
//! primitives used by the memoria MCP and REST servers:
//!
//! - A SQLite-backed repository layer (`storage`) with WAL journaling,
//!   content-addressed payload compression, and chunking for large memories.
//! - An embedding abstraction (`embeddings`) with a deterministic local
//!   provider and an HTTP-backed remote provider.
//! - An HNSW vector index (`search`) for approximate nearest-neighbor recall.
//! - A TTL-bounded result cache (`cache`).
//! - The memory engine (`engine`) that ties the above into create / search /
//!   relate / ingest / analyze operations with per-memory concurrency control.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod memory;
pub mod search;
pub mod storage;
pub mod strategies;

pub use config::Config;
pub use engine::MemoryEngine;
pub use error::{EngineError, ErrorCode};
pub use memory::{
    Context, CreateContextInput, CreateMemoryInput, CreateRelationInput, Memory, MemoryStats,
    Relation, ScoredMemory, SearchQuery, SemanticSearchQuery, UpdateMemoryInput, User,
};
pub use storage::Storage;
