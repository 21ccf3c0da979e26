//! Shared library surface for the `memoria-mcp`, `memoria-rest`, and
//! `memoria` binaries: the JSON-RPC protocol types, the tool catalog,
//! the MCP server itself, the REST router, JWT auth, and the bootstrap
//! helpers all three binaries use to stand up a [`memoria_core::MemoryEngine`].

pub mod auth;
pub mod protocol;
pub mod rest;
pub mod server;
pub mod startup;
pub mod tools;
