//! Bootstrap helpers shared by the `memoria-mcp`, `memoria-rest`, and
//! `memoria` binaries: logging initialization, engine construction from
//! [`memoria_core::Config`], and the background reindex worker.

use std::io;
use std::sync::Arc;

use memoria_core::embeddings::{EmbeddingProvider, LocalEmbeddingProvider, RemoteEmbeddingProvider};
use memoria_core::{Config, MemoryEngine, Storage};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes structured logging to stderr, since stdout/stdin carry
/// the MCP JSON-RPC stream for the `memoria-mcp` binary. `RUST_LOG`
/// overrides the default `info` level.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();
}

fn build_embedding_provider(config: &Config) -> Arc<dyn EmbeddingProvider> {
    match &config.embedding.remote_endpoint {
        Some(endpoint) => {
            tracing::info!(endpoint, "using remote embedding provider");
            Arc::new(RemoteEmbeddingProvider::new(
                endpoint.clone(),
                config.embedding.remote_api_key.clone(),
                config.embedding.max_in_flight,
            ))
        }
        None => {
            tracing::info!("using local hashed-bag-of-words embedding provider");
            Arc::new(LocalEmbeddingProvider::new())
        }
    }
}

/// Builds a [`MemoryEngine`] over a fresh [`Storage`] for `config`,
/// rehydrating the vector index from persisted embedding records
/// before returning.
pub async fn build_engine(config: Config) -> anyhow::Result<Arc<MemoryEngine>> {
    config.validate()?;
    let embeddings = build_embedding_provider(&config);
    let storage = Arc::new(Storage::new(config)?);
    let engine = Arc::new(MemoryEngine::new(storage, embeddings)?);

    let loaded = engine.rehydrate_index().await?;
    tracing::info!(loaded, "vector index rehydrated from persisted embedding records");

    Ok(engine)
}

/// Spawns the background task that converges the vector index after an
/// embedding provider change: on an interval, it scans for embedding
/// records whose provider tag no longer matches the active provider
/// and re-embeds a small batch of them, so a provider switch doesn't
/// require every memory to be read again first.
pub fn spawn_reindex_worker(engine: Arc<MemoryEngine>) {
    tokio::spawn(async move {
        let interval_seconds: u64 = std::env::var("MEMORIA_REINDEX_INTERVAL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);
        const BATCH_SIZE: usize = 50;

        loop {
            tokio::time::sleep(std::time::Duration::from_secs(interval_seconds)).await;
            match engine.reindex_stale_embeddings(BATCH_SIZE).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(reindexed = n, "background reindex converged a batch"),
                Err(e) => tracing::warn!(error = %e, "background reindex pass failed"),
            }
        }
    });
}
