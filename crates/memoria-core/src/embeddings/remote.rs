//! HTTP-backed embedding provider.
//!
//! Calls an external embedding service. Concurrency is bounded with a
//! semaphore (the spec caps at 8 in-flight requests) and transient
//! failures are retried with exponential backoff and jitter.

use super::local::{EmbeddingError, EMBEDDING_DIMENSIONS};
use super::{Embedding, EmbeddingProvider};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

const MAX_RETRIES: u32 = 5;
const BASE_BACKOFF_MS: u64 = 200;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

pub struct RemoteEmbeddingProvider {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
    inflight: Arc<Semaphore>,
}

impl RemoteEmbeddingProvider {
    pub fn new(endpoint: String, api_key: Option<String>, max_in_flight: usize) -> Self {
        Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
            inflight: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    async fn embed_one(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let _permit = self
            .inflight
            .acquire()
            .await
            .map_err(|e| EmbeddingError::Remote(e.to_string()))?;

        let mut attempt = 0;
        loop {
            let result = self.try_request(text).await;
            match result {
                Ok(embedding) => return Ok(embedding),
                Err(err) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    let backoff = backoff_duration(attempt);
                    tracing::warn!(attempt, %err, "remote embedding request failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_request(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut request = self.client.post(&self.endpoint).json(&EmbedRequest { input: text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::Remote(format!(
                "remote embedding service returned {}",
                response.status()
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Remote(e.to_string()))?;

        Ok(Embedding { vector: body.embedding })
    }
}

/// Exponential backoff with ±20% jitter, capped at 5 retries.
fn backoff_duration(attempt: u32) -> Duration {
    let base = BASE_BACKOFF_MS * 2u64.saturating_pow(attempt - 1);
    let jitter_fraction = rand::thread_rng().gen_range(-0.2..=0.2);
    let millis = (base as f64 * (1.0 + jitter_fraction)).max(0.0) as u64;
    Duration::from_millis(millis)
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed_one(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let futures = texts.iter().map(|t| self.embed_one(t));
        futures::future::try_join_all(futures).await
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }

    fn provider_tag(&self) -> &'static str {
        "remote-http-v1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_stays_jittered() {
        let d1 = backoff_duration(1);
        let d3 = backoff_duration(3);
        assert!(d1.as_millis() > 0);
        assert!(d3.as_millis() >= d1.as_millis());
    }
}
