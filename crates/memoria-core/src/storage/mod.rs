//! Storage module
//!
//! SQLite-backed persistence with FTS5 keyword search, adaptive
//! compression/chunking of memory bodies, and embedding record storage
//! used to rehydrate the vector index on startup.

mod migrations;
mod sqlite;

pub use migrations::{get_current_version, Migration, MIGRATIONS};
pub use sqlite::{Result, Storage, StorageError};
