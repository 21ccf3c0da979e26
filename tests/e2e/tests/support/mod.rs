//! Shared fixture for the end-to-end scenario tests: a real engine over
//! a temp-dir SQLite database, the same construction path the server
//! binaries use, just pointed at a throwaway directory per test.

use std::sync::Arc;

use memoria_core::embeddings::{EmbeddingProvider, LocalEmbeddingProvider};
use memoria_core::{Config, MemoryEngine, Storage};

pub fn test_engine() -> (MemoryEngine, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = dir.path().to_path_buf();
    let storage = Arc::new(Storage::new(config).unwrap());
    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(LocalEmbeddingProvider::new());
    (MemoryEngine::new(storage, embeddings).unwrap(), dir)
}

/// Flips the low bit of the first byte of `memory_id`'s stored payload,
/// reaching past the engine's public API straight into the SQLite file
/// the way no well-behaved caller ever would. Used only to manufacture
/// the corruption the engine's integrity check is supposed to catch.
pub fn corrupt_stored_payload(data_dir: &std::path::Path, memory_id: &str) {
    let db_path = data_dir.join("memoria.db");
    let conn = rusqlite::Connection::open(db_path).unwrap();

    let chunk_count: i64 = conn
        .query_row(
            "SELECT chunk_count FROM memories WHERE id = ?1",
            [memory_id],
            |row| row.get(0),
        )
        .unwrap();

    if chunk_count > 0 {
        let mut data: Vec<u8> = conn
            .query_row(
                "SELECT data FROM memory_chunks WHERE memory_id = ?1 AND sequence = 0",
                [memory_id],
                |row| row.get(0),
            )
            .unwrap();
        data[0] ^= 0xFF;
        conn.execute(
            "UPDATE memory_chunks SET data = ?1 WHERE memory_id = ?2 AND sequence = 0",
            rusqlite::params![data, memory_id],
        )
        .unwrap();
    } else {
        let mut content: Vec<u8> = conn
            .query_row(
                "SELECT content FROM memories WHERE id = ?1",
                [memory_id],
                |row| row.get(0),
            )
            .unwrap();
        content[0] ^= 0xFF;
        conn.execute(
            "UPDATE memories SET content = ?1 WHERE id = ?2",
            rusqlite::params![content, memory_id],
        )
        .unwrap();
    }
}
