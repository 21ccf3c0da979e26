//! Storage strategies: content-addressed compression and chunking for
//! oversized memory payloads.

use crate::config::{ChunkingConfig, CompressionConfig};
use crate::memory::Codec;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("compression failed: {0}")]
    Compress(#[from] std::io::Error),

    #[error("decompression failed: {0}")]
    Decompress(String),
}

/// Result of applying a compression strategy to raw content bytes.
pub struct EncodedPayload {
    pub codec: Codec,
    pub bytes: Vec<u8>,
    pub content_hash: String,
}

/// SHA-256 hex digest of `data`. The spec is explicit about SHA-256 for
/// content hashing, independent of whatever hashing a cache layer uses.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Encode `content` per `cfg`. The adaptive codec only keeps the
/// compressed form when it beats `adaptive_ratio_threshold` and the
/// input is at least `min_size_bytes`; otherwise it falls back to
/// storing the content uncompressed.
pub fn encode(content: &[u8], cfg: &CompressionConfig) -> Result<EncodedPayload, StrategyError> {
    let hash = content_hash(content);

    let (codec, bytes) = match cfg.codec {
        Codec::None => (Codec::None, content.to_vec()),
        Codec::Zstd => {
            let compressed = zstd::encode_all(content, 0)?;
            (Codec::Zstd, compressed)
        }
        Codec::Adaptive => {
            if content.len() < cfg.min_size_bytes {
                (Codec::None, content.to_vec())
            } else {
                let compressed = zstd::encode_all(content, 0)?;
                let ratio = compressed.len() as f64 / content.len() as f64;
                if ratio < cfg.adaptive_ratio_threshold {
                    (Codec::Zstd, compressed)
                } else {
                    (Codec::None, content.to_vec())
                }
            }
        }
    };

    Ok(EncodedPayload {
        codec,
        bytes,
        content_hash: hash,
    })
}

/// Decode bytes previously produced by [`encode`].
pub fn decode(bytes: &[u8], codec: Codec) -> Result<Vec<u8>, StrategyError> {
    match codec {
        Codec::None | Codec::Adaptive => Ok(bytes.to_vec()),
        Codec::Zstd => zstd::decode_all(bytes).map_err(|e| StrategyError::Decompress(e.to_string())),
    }
}

/// Splits the (possibly compressed) `bytes` into fixed-size chunks once
/// the pre-compression `original_len` exceeds `threshold_bytes`. The
/// chunking decision is made on the original content length, not the
/// compressed length, so a highly compressible payload still declares
/// itself chunked even if compression leaves it small enough to fit in
/// a single chunk row. Returns `None` when chunking does not apply
/// (content fits in a single row).
pub fn chunk<'a>(bytes: &'a [u8], original_len: usize, cfg: &ChunkingConfig) -> Option<Vec<&'a [u8]>> {
    if original_len <= cfg.threshold_bytes {
        return None;
    }
    Some(bytes.chunks(cfg.chunk_size_bytes.max(1)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CompressionConfig {
        CompressionConfig::default()
    }

    #[test]
    fn none_codec_roundtrips() {
        let cfg = CompressionConfig {
            codec: Codec::None,
            ..cfg()
        };
        let data = b"hello world";
        let encoded = encode(data, &cfg).unwrap();
        assert_eq!(encoded.codec, Codec::None);
        let decoded = decode(&encoded.bytes, encoded.codec).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn zstd_codec_roundtrips() {
        let cfg = CompressionConfig {
            codec: Codec::Zstd,
            ..cfg()
        };
        let data = "repeat ".repeat(500).into_bytes();
        let encoded = encode(&data, &cfg).unwrap();
        assert_eq!(encoded.codec, Codec::Zstd);
        assert!(encoded.bytes.len() < data.len());
        let decoded = decode(&encoded.bytes, encoded.codec).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn adaptive_skips_small_payloads() {
        let cfg = CompressionConfig {
            codec: Codec::Adaptive,
            min_size_bytes: 1024,
            ..cfg()
        };
        let data = b"tiny";
        let encoded = encode(data, &cfg).unwrap();
        assert_eq!(encoded.codec, Codec::None);
    }

    #[test]
    fn adaptive_compresses_when_ratio_beats_threshold() {
        let cfg = CompressionConfig {
            codec: Codec::Adaptive,
            adaptive_ratio_threshold: 0.9,
            min_size_bytes: 16,
        };
        let data = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".repeat(20).into_bytes();
        let encoded = encode(&data, &cfg).unwrap();
        assert_eq!(encoded.codec, Codec::Zstd);
    }

    #[test]
    fn content_hash_is_stable() {
        let a = content_hash(b"same bytes");
        let b = content_hash(b"same bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn chunking_splits_oversized_content() {
        let cfg = ChunkingConfig {
            threshold_bytes: 10,
            chunk_size_bytes: 4,
        };
        let data = b"0123456789abcdef";
        let chunks = chunk(data, data.len(), &cfg).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], b"0123");
    }

    #[test]
    fn chunking_skips_small_content() {
        let cfg = ChunkingConfig {
            threshold_bytes: 64 * 1024,
            chunk_size_bytes: 32 * 1024,
        };
        assert!(chunk(b"small", 5, &cfg).is_none());
    }

    #[test]
    fn chunking_decision_follows_original_length_not_compressed_length() {
        let cfg = ChunkingConfig {
            threshold_bytes: 10,
            chunk_size_bytes: 4,
        };
        let compressed = b"ab";
        let chunks = chunk(compressed, 200, &cfg).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], compressed.as_slice());
    }
}
