//! Shared test fixture for tool-level tests.
#![cfg(test)]

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
