//! MCP protocol implementation: JSON-RPC 2.0 over stdio.

pub mod messages;
pub mod stdio;
pub mod types;
