//! Deterministic local embedding provider.
//!
//! Runs entirely in-process: no model download, no network access, no
//! GPU. Text is embedded with a hashed bag-of-words scheme (the
//! "hashing trick") at a fixed dimensionality, normalized to unit
//! length so cosine similarity behaves the way callers expect from a
//! learned embedding model.
//!
//! This is not a substitute for a trained embedding model's semantic
//! quality, but it gives every caller a working, offline, reproducible
//! default, and the same [`EmbeddingProvider`] interface that the
//! HTTP-backed [`super::remote::RemoteEmbeddingProvider`] implements.

use super::EmbeddingProvider;
use async_trait::async_trait;

pub const EMBEDDING_DIMENSIONS: usize = 384;
const MAX_TEXT_LENGTH: usize = 32_768;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("input text exceeds maximum length of {max} characters")]
    TooLong { max: usize },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("remote embedding request failed: {0}")]
    Remote(String),
}

/// A fixed-dimension embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.vector.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EmbeddingError> {
        if bytes.len() % 4 != 0 {
            return Err(EmbeddingError::DimensionMismatch {
                expected: EMBEDDING_DIMENSIONS,
                actual: bytes.len() / 4,
            });
        }
        let vector = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { vector })
    }
}

/// Cosine distance turned into a bounded similarity score.
///
/// Plain `1.0 - cosine_distance` can go negative for dissimilar
/// vectors and collapses orthogonal and opposite vectors to the same
/// sign; `1 / (1 + distance)` stays in `(0, 1]` and degrades smoothly.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let distance = cosine_distance(a, b);
    1.0 / (1.0 + distance)
}

pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_a * norm_b))
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Hashes a token into one of `EMBEDDING_DIMENSIONS` buckets with a
/// sign derived from a second hash, the standard feature-hashing trick
/// for reducing collision bias.
fn hash_token(token: &str) -> (usize, f32) {
    let mut h1: u64 = 0xcbf29ce484222325;
    for b in token.bytes() {
        h1 ^= b as u64;
        h1 = h1.wrapping_mul(0x100000001b3);
    }
    let mut h2: u64 = 0x9e3779b97f4a7c15;
    for b in token.bytes() {
        h2 ^= b as u64;
        h2 = h2.wrapping_mul(0xff51afd7ed558ccd);
    }
    let bucket = (h1 as usize) % EMBEDDING_DIMENSIONS;
    let sign = if h2 % 2 == 0 { 1.0 } else { -1.0 };
    (bucket, sign)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn embed_text(text: &str) -> Result<Embedding, EmbeddingError> {
    if text.trim().is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }
    if text.len() > MAX_TEXT_LENGTH {
        return Err(EmbeddingError::TooLong { max: MAX_TEXT_LENGTH });
    }

    let tokens = tokenize(text);
    let mut vector = vec![0.0f32; EMBEDDING_DIMENSIONS];

    for token in &tokens {
        let (bucket, sign) = hash_token(token);
        vector[bucket] += sign;
    }
    // unigrams carry most of the signal; bigrams give the hash space a
    // little word-order sensitivity without a real tokenizer.
    for pair in tokens.windows(2) {
        let bigram = format!("{}_{}", pair[0], pair[1]);
        let (bucket, sign) = hash_token(&bigram);
        vector[bucket] += 0.5 * sign;
    }

    normalize(&mut vector);
    Ok(Embedding { vector })
}

/// Deterministic, offline [`EmbeddingProvider`].
#[derive(Debug, Default)]
pub struct LocalEmbeddingProvider;

impl LocalEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        embed_text(text)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        texts.iter().map(|t| embed_text(t)).collect()
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }

    fn provider_tag(&self) -> &'static str {
        "local-hashed-v1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embed_rejects_empty_input() {
        let provider = LocalEmbeddingProvider::new();
        let err = provider.embed("").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyInput));
    }

    #[tokio::test]
    async fn embed_produces_fixed_dimensions() {
        let provider = LocalEmbeddingProvider::new();
        let embedding = provider.embed("hello world").await.unwrap();
        assert_eq!(embedding.dimensions(), EMBEDDING_DIMENSIONS);
    }

    #[tokio::test]
    async fn embed_is_deterministic() {
        let provider = LocalEmbeddingProvider::new();
        let a = provider.embed("the quick brown fox").await.unwrap();
        let b = provider.embed("the quick brown fox").await.unwrap();
        assert_eq!(a.vector, b.vector);
    }

    #[tokio::test]
    async fn similar_text_scores_higher_than_unrelated_text() {
        let provider = LocalEmbeddingProvider::new();
        let a = provider.embed("rust memory safety and ownership").await.unwrap();
        let b = provider
            .embed("rust ownership and memory safety rules")
            .await
            .unwrap();
        let c = provider.embed("weather forecast for tomorrow").await.unwrap();

        let sim_ab = cosine_similarity(&a.vector, &b.vector);
        let sim_ac = cosine_similarity(&a.vector, &c.vector);
        assert!(sim_ab > sim_ac);
    }

    #[test]
    fn embedding_bytes_roundtrip() {
        let embedding = Embedding {
            vector: vec![0.1, -0.2, 0.3],
        };
        let bytes = embedding.to_bytes();
        let back = Embedding::from_bytes(&bytes).unwrap();
        assert_eq!(embedding.vector, back.vector);
    }

    #[test]
    fn cosine_similarity_is_bounded() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim > 0.0 && sim <= 1.0);
    }
}
