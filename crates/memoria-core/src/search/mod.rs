//! Search module: HNSW vector search plus FTS5 keyword search helpers.

mod keyword;
mod vector;

pub use keyword::sanitize_fts5_query;
pub use vector::{
    VectorIndex, VectorIndexConfig, VectorIndexStats, VectorMetadata, VectorSearchError,
    DEFAULT_CONNECTIVITY, DEFAULT_DIMENSIONS, MAX_CANDIDATES, OVER_FETCH_FACTOR,
};
