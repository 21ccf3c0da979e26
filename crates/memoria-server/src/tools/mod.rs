//! MCP tool implementations.
//!
//! Each submodule exposes a `schema() -> Value` (the tool's JSON Schema
//! input shape, advertised via `tools/list`) and an async `execute`
//! that validates its arguments, calls into the engine, and returns a
//! JSON value or a human-readable error string. `server::handle_tools_call`
//! dispatches to these by tool name.

pub mod analyze_content;
pub mod analyze_knowledge_graph;
pub mod bulk_create_memories;
pub mod bulk_create_relations;
pub mod categorize_memories;
pub mod create_context;
pub mod create_large_memory;
pub mod create_memory;
pub mod create_relation;
pub mod delete_memory;
pub mod find_similar_knowledge;
pub mod get_memory_relations;
pub mod get_memory_statistics;
pub mod index_knowledge_batch;
pub mod ingest_knowledge;
pub mod search_memories;
pub mod search_semantic;
pub mod summarize_memory;
pub mod update_memory;

#[cfg(test)]
mod test_support;

/// Names of the 19 tools this server advertises, in catalog order.
pub const TOOL_NAMES: [&str; 19] = [
    "create_memory",
    "search_memories",
    "update_memory",
    "delete_memory",
    "get_memory_statistics",
    "bulk_create_memories",
    "create_large_memory",
    "categorize_memories",
    "analyze_content",
    "summarize_memory",
    "create_context",
    "create_relation",
    "get_memory_relations",
    "bulk_create_relations",
    "search_semantic",
    "analyze_knowledge_graph",
    "ingest_knowledge",
    "index_knowledge_batch",
    "find_similar_knowledge",
];
