//! Environment configuration for the memory engine and its storage
//! backends.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("{name} must be set in the environment, no default is provided")]
    MissingRequiredEnv { name: &'static str },

    #[error("auth.jwt_secret must be at least 32 bytes")]
    WeakSecret,
}

#[derive(Debug, Clone)]
pub struct CompressionConfig {
    pub codec: crate::memory::Codec,
    /// Adaptive codec only compresses when the ratio is below this and
    /// the payload is at least `min_size_bytes`.
    pub adaptive_ratio_threshold: f64,
    pub min_size_bytes: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: crate::memory::Codec::Adaptive,
            adaptive_ratio_threshold: 0.9,
            min_size_bytes: 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub threshold_bytes: usize,
    pub chunk_size_bytes: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            threshold_bytes: 64 * 1024,
            chunk_size_bytes: 32 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// When set, the remote HTTP embedding provider is used instead of
    /// the local deterministic one.
    pub remote_endpoint: Option<String>,
    pub remote_api_key: Option<String>,
    pub max_in_flight: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            remote_endpoint: None,
            remote_api_key: None,
            max_in_flight: 8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            max_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
}

impl Default for AuthConfig {
    /// Empty on purpose: there is no source-level fallback secret.
    /// `from_env` requires `MEMORIA_JWT_SECRET` and `validate` rejects
    /// anything shorter than 32 bytes, so an unconfigured secret is
    /// caught before the server ever starts.
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_seconds: 86_400,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub bulk_batch_size: usize,
    pub max_search_top_k: usize,
    pub request_timeout_seconds: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            bulk_batch_size: 100,
            max_search_top_k: 200,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub vector_store_path: PathBuf,
    pub compression: CompressionConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
    pub rest_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        let vector_store_path = data_dir.join("vectors");
        Self {
            data_dir,
            vector_store_path,
            compression: CompressionConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            cache: CacheConfig::default(),
            auth: AuthConfig::default(),
            limits: LimitsConfig::default(),
            rest_port: 8420,
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "memoria", "memoria")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./.memoria"))
}

impl Config {
    const ENV_DATA_DIR: &'static str = "MEMORIA_DATA_DIR";
    const ENV_VECTOR_STORE_PATH: &'static str = "MEMORIA_VECTOR_STORE_PATH";
    const ENV_COMPRESSION_CODEC: &'static str = "MEMORIA_COMPRESSION_CODEC";
    const ENV_CHUNK_THRESHOLD_BYTES: &'static str = "MEMORIA_CHUNK_THRESHOLD_BYTES";
    const ENV_CHUNK_SIZE_BYTES: &'static str = "MEMORIA_CHUNK_SIZE_BYTES";
    const ENV_EMBEDDING_REMOTE_ENDPOINT: &'static str = "MEMORIA_EMBEDDING_REMOTE_ENDPOINT";
    const ENV_EMBEDDING_REMOTE_API_KEY: &'static str = "MEMORIA_EMBEDDING_REMOTE_API_KEY";
    const ENV_EMBEDDING_MAX_IN_FLIGHT: &'static str = "MEMORIA_EMBEDDING_MAX_IN_FLIGHT";
    const ENV_CACHE_TTL_SECONDS: &'static str = "MEMORIA_CACHE_TTL_SECONDS";
    const ENV_CACHE_MAX_CAPACITY: &'static str = "MEMORIA_CACHE_MAX_CAPACITY";
    const ENV_JWT_SECRET: &'static str = "MEMORIA_JWT_SECRET";
    const ENV_TOKEN_TTL_SECONDS: &'static str = "MEMORIA_TOKEN_TTL_SECONDS";
    const ENV_BULK_BATCH_SIZE: &'static str = "MEMORIA_BULK_BATCH_SIZE";
    const ENV_MAX_SEARCH_TOP_K: &'static str = "MEMORIA_MAX_SEARCH_TOP_K";
    const ENV_REQUEST_TIMEOUT_SECONDS: &'static str = "MEMORIA_REQUEST_TIMEOUT_SECONDS";
    const ENV_REST_PORT: &'static str = "MEMORIA_REST_PORT";

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let data_dir = Self::parse_path_from_env(Self::ENV_DATA_DIR, defaults.data_dir.clone());
        let vector_store_path = Self::parse_path_from_env(
            Self::ENV_VECTOR_STORE_PATH,
            data_dir.join("vectors"),
        );

        let codec = match env::var(Self::ENV_COMPRESSION_CODEC) {
            Ok(v) => crate::memory::Codec::parse_name(&v).ok_or_else(|| ConfigError::InvalidValue {
                name: Self::ENV_COMPRESSION_CODEC,
                value: v,
            })?,
            Err(_) => defaults.compression.codec,
        };

        let compression = CompressionConfig {
            codec,
            adaptive_ratio_threshold: defaults.compression.adaptive_ratio_threshold,
            min_size_bytes: Self::parse_usize_from_env(
                "MEMORIA_COMPRESSION_MIN_SIZE_BYTES",
                defaults.compression.min_size_bytes,
            ),
        };

        let chunking = ChunkingConfig {
            threshold_bytes: Self::parse_usize_from_env(
                Self::ENV_CHUNK_THRESHOLD_BYTES,
                defaults.chunking.threshold_bytes,
            ),
            chunk_size_bytes: Self::parse_usize_from_env(
                Self::ENV_CHUNK_SIZE_BYTES,
                defaults.chunking.chunk_size_bytes,
            ),
        };

        let embedding = EmbeddingConfig {
            remote_endpoint: Self::parse_optional_string_from_env(
                Self::ENV_EMBEDDING_REMOTE_ENDPOINT,
            ),
            remote_api_key: Self::parse_optional_string_from_env(
                Self::ENV_EMBEDDING_REMOTE_API_KEY,
            ),
            max_in_flight: Self::parse_usize_from_env(
                Self::ENV_EMBEDDING_MAX_IN_FLIGHT,
                defaults.embedding.max_in_flight,
            ),
        };

        let cache = CacheConfig {
            ttl_seconds: Self::parse_u64_from_env(
                Self::ENV_CACHE_TTL_SECONDS,
                defaults.cache.ttl_seconds,
            ),
            max_capacity: Self::parse_u64_from_env(
                Self::ENV_CACHE_MAX_CAPACITY,
                defaults.cache.max_capacity,
            ),
        };

        let auth = AuthConfig {
            jwt_secret: env::var(Self::ENV_JWT_SECRET).map_err(|_| ConfigError::MissingRequiredEnv {
                name: Self::ENV_JWT_SECRET,
            })?,
            token_ttl_seconds: Self::parse_i64_from_env(
                Self::ENV_TOKEN_TTL_SECONDS,
                defaults.auth.token_ttl_seconds,
            ),
        };

        let limits = LimitsConfig {
            bulk_batch_size: Self::parse_usize_from_env(
                Self::ENV_BULK_BATCH_SIZE,
                defaults.limits.bulk_batch_size,
            ),
            max_search_top_k: Self::parse_usize_from_env(
                Self::ENV_MAX_SEARCH_TOP_K,
                defaults.limits.max_search_top_k,
            ),
            request_timeout_seconds: Self::parse_u64_from_env(
                Self::ENV_REQUEST_TIMEOUT_SECONDS,
                defaults.limits.request_timeout_seconds,
            ),
        };

        let rest_port = Self::parse_u16_from_env(Self::ENV_REST_PORT, defaults.rest_port)?;

        Ok(Self {
            data_dir,
            vector_store_path,
            compression,
            chunking,
            embedding,
            cache,
            auth,
            limits,
            rest_port,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.exists() && !self.data_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.data_dir.clone(),
            });
        }
        if self.chunking.chunk_size_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_CHUNK_SIZE_BYTES,
                value: "0".to_string(),
            });
        }
        if self.auth.jwt_secret.len() < 32 {
            return Err(ConfigError::WeakSecret);
        }
        Ok(())
    }

    fn parse_path_from_env(var: &str, default: PathBuf) -> PathBuf {
        env::var(var).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var: &str) -> Option<String> {
        env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_usize_from_env(var: &str, default: usize) -> usize {
        env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    fn parse_u64_from_env(var: &str, default: u64) -> u64 {
        env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    fn parse_i64_from_env(var: &str, default: i64) -> i64 {
        env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    fn parse_u16_from_env(var: &'static str, default: u16) -> Result<u16, ConfigError> {
        match env::var(var) {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: var,
                value,
            }),
            Err(_) => Ok(default),
        }
    }
}
