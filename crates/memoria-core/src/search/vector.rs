//! HNSW vector index over memory embeddings, backed by USearch.

use std::collections::HashMap;
use std::path::Path;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

pub const DEFAULT_DIMENSIONS: usize = crate::embeddings::EMBEDDING_DIMENSIONS;
pub const DEFAULT_CONNECTIVITY: usize = 16;
pub const DEFAULT_EXPANSION_ADD: usize = 128;
pub const DEFAULT_EXPANSION_SEARCH: usize = 64;

/// Over-fetch multiplier applied before owner/context filtering, capped
/// at `MAX_CANDIDATES` so a single query can't force an unbounded scan.
pub const OVER_FETCH_FACTOR: usize = 4;
pub const MAX_CANDIDATES: usize = 200;

#[derive(Debug, Clone)]
pub enum VectorSearchError {
    IndexCreation(String),
    IndexAdd(String),
    IndexSearch(String),
    IndexPersistence(String),
    InvalidDimensions(usize, usize),
}

impl std::fmt::Display for VectorSearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorSearchError::IndexCreation(e) => write!(f, "index creation failed: {e}"),
            VectorSearchError::IndexAdd(e) => write!(f, "failed to add vector: {e}"),
            VectorSearchError::IndexSearch(e) => write!(f, "search failed: {e}"),
            VectorSearchError::IndexPersistence(e) => write!(f, "persistence failed: {e}"),
            VectorSearchError::InvalidDimensions(expected, got) => {
                write!(f, "invalid dimensions: expected {expected}, got {got}")
            }
        }
    }
}

impl std::error::Error for VectorSearchError {}

#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    pub dimensions: usize,
    pub connectivity: usize,
    pub expansion_add: usize,
    pub expansion_search: usize,
    pub metric: MetricKind,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
            connectivity: DEFAULT_CONNECTIVITY,
            expansion_add: DEFAULT_EXPANSION_ADD,
            expansion_search: DEFAULT_EXPANSION_SEARCH,
            metric: MetricKind::Cos,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorIndexStats {
    pub total_vectors: usize,
    pub dimensions: usize,
    pub connectivity: usize,
    pub memory_bytes: usize,
}

/// Sidecar metadata kept alongside each indexed vector, used to filter
/// over-fetched candidates down to what the caller is allowed to see.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct VectorMetadata {
    pub owner_id: String,
    pub context_id: Option<String>,
}

/// HNSW index over memory embeddings, keyed by memory id.
pub struct VectorIndex {
    index: Index,
    config: VectorIndexConfig,
    key_to_id: HashMap<String, u64>,
    id_to_key: HashMap<u64, String>,
    metadata: HashMap<String, VectorMetadata>,
    next_id: u64,
}

impl VectorIndex {
    pub fn new() -> Result<Self, VectorSearchError> {
        Self::with_config(VectorIndexConfig::default())
    }

    pub fn with_config(config: VectorIndexConfig) -> Result<Self, VectorSearchError> {
        let options = IndexOptions {
            dimensions: config.dimensions,
            metric: config.metric,
            quantization: ScalarKind::F32,
            connectivity: config.connectivity,
            expansion_add: config.expansion_add,
            expansion_search: config.expansion_search,
            multi: false,
        };

        let index = Index::new(&options).map_err(|e| VectorSearchError::IndexCreation(e.to_string()))?;

        Ok(Self {
            index,
            config,
            key_to_id: HashMap::new(),
            id_to_key: HashMap::new(),
            metadata: HashMap::new(),
            next_id: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    pub fn reserve(&self, capacity: usize) -> Result<(), VectorSearchError> {
        self.index
            .reserve(capacity)
            .map_err(|e| VectorSearchError::IndexCreation(format!("failed to reserve capacity: {e}")))
    }

    /// Add or update the vector for `key`, tagged with `metadata` for
    /// later filtering.
    pub fn add(&mut self, key: &str, vector: &[f32], metadata: VectorMetadata) -> Result<(), VectorSearchError> {
        if vector.len() != self.config.dimensions {
            return Err(VectorSearchError::InvalidDimensions(self.config.dimensions, vector.len()));
        }

        self.metadata.insert(key.to_string(), metadata);

        if let Some(&existing_id) = self.key_to_id.get(key) {
            self.index
                .remove(existing_id)
                .map_err(|e| VectorSearchError::IndexAdd(e.to_string()))?;
            self.reserve(self.index.size() + 1)?;
            self.index
                .add(existing_id, vector)
                .map_err(|e| VectorSearchError::IndexAdd(e.to_string()))?;
            return Ok(());
        }

        let current_capacity = self.index.capacity();
        let current_size = self.index.size();
        if current_size >= current_capacity {
            let new_capacity = std::cmp::max(current_capacity * 2, 16);
            self.reserve(new_capacity)?;
        }

        let id = self.next_id;
        self.next_id += 1;

        self.index
            .add(id, vector)
            .map_err(|e| VectorSearchError::IndexAdd(e.to_string()))?;

        self.key_to_id.insert(key.to_string(), id);
        self.id_to_key.insert(id, key.to_string());

        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<bool, VectorSearchError> {
        self.metadata.remove(key);
        if let Some(id) = self.key_to_id.remove(key) {
            self.id_to_key.remove(&id);
            self.index
                .remove(id)
                .map_err(|e| VectorSearchError::IndexAdd(e.to_string()))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.key_to_id.contains_key(key)
    }

    /// Raw nearest-neighbor search with no owner/context filtering.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(String, f32)>, VectorSearchError> {
        if query.len() != self.config.dimensions {
            return Err(VectorSearchError::InvalidDimensions(self.config.dimensions, query.len()));
        }
        if self.is_empty() {
            return Ok(vec![]);
        }

        let results = self
            .index
            .search(query, limit)
            .map_err(|e| VectorSearchError::IndexSearch(e.to_string()))?;

        let mut search_results = Vec::with_capacity(results.keys.len());
        for (key, distance) in results.keys.iter().zip(results.distances.iter()) {
            if let Some(string_key) = self.id_to_key.get(key) {
                // 1/(1+distance) stays in (0,1] for cosine distance;
                // plain 1-distance can go negative and doesn't degrade
                // smoothly for dissimilar vectors.
                let score = 1.0 / (1.0 + distance);
                search_results.push((string_key.clone(), score));
            }
        }

        Ok(search_results)
    }

    /// Nearest-neighbor search restricted to `owner_id` (and optionally
    /// `context_id`), over-fetching `top_k * OVER_FETCH_FACTOR` (capped
    /// at `MAX_CANDIDATES`) candidates so post-filtering still leaves
    /// enough matches.
    pub fn search_scoped(
        &self,
        query: &[f32],
        top_k: usize,
        owner_id: &str,
        context_id: Option<&str>,
    ) -> Result<Vec<(String, f32)>, VectorSearchError> {
        let candidates = (top_k * OVER_FETCH_FACTOR).min(MAX_CANDIDATES).max(top_k);
        let raw = self.search(query, candidates)?;

        let filtered: Vec<(String, f32)> = raw
            .into_iter()
            .filter(|(key, _)| match self.metadata.get(key) {
                Some(meta) => {
                    meta.owner_id == owner_id
                        && context_id.is_none_or(|ctx| meta.context_id.as_deref() == Some(ctx))
                }
                None => false,
            })
            .take(top_k)
            .collect();

        Ok(filtered)
    }

    pub fn search_with_threshold(
        &self,
        query: &[f32],
        limit: usize,
        min_similarity: f32,
    ) -> Result<Vec<(String, f32)>, VectorSearchError> {
        let results = self.search(query, limit)?;
        Ok(results.into_iter().filter(|(_, score)| *score >= min_similarity).collect())
    }

    pub fn save(&self, path: &Path) -> Result<(), VectorSearchError> {
        let path_str = path.to_str().ok_or_else(|| VectorSearchError::IndexPersistence("invalid path".to_string()))?;

        self.index
            .save(path_str)
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;

        let mappings_path = path.with_extension("mappings.json");
        let mappings = serde_json::json!({
            "key_to_id": self.key_to_id,
            "next_id": self.next_id,
            "metadata": self.metadata,
        });
        let mappings_str =
            serde_json::to_string(&mappings).map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;
        std::fs::write(&mappings_path, mappings_str).map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;

        Ok(())
    }

    pub fn load(path: &Path, config: VectorIndexConfig) -> Result<Self, VectorSearchError> {
        let path_str = path.to_str().ok_or_else(|| VectorSearchError::IndexPersistence("invalid path".to_string()))?;

        let options = IndexOptions {
            dimensions: config.dimensions,
            metric: config.metric,
            quantization: ScalarKind::F32,
            connectivity: config.connectivity,
            expansion_add: config.expansion_add,
            expansion_search: config.expansion_search,
            multi: false,
        };

        let index = Index::new(&options).map_err(|e| VectorSearchError::IndexCreation(e.to_string()))?;
        index.load(path_str).map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;

        let mappings_path = path.with_extension("mappings.json");
        let mappings_str =
            std::fs::read_to_string(&mappings_path).map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;
        let mappings: serde_json::Value =
            serde_json::from_str(&mappings_str).map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;

        let key_to_id: HashMap<String, u64> = serde_json::from_value(mappings["key_to_id"].clone())
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;
        let metadata: HashMap<String, VectorMetadata> = mappings
            .get("metadata")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e: serde_json::Error| VectorSearchError::IndexPersistence(e.to_string()))?
            .unwrap_or_default();
        let next_id: u64 = mappings["next_id"]
            .as_u64()
            .ok_or_else(|| VectorSearchError::IndexPersistence("invalid next_id".to_string()))?;

        let id_to_key: HashMap<u64, String> = key_to_id.iter().map(|(k, &v)| (v, k.clone())).collect();

        Ok(Self {
            index,
            config,
            key_to_id,
            id_to_key,
            metadata,
            next_id,
        })
    }

    pub fn stats(&self) -> VectorIndexStats {
        VectorIndexStats {
            total_vectors: self.len(),
            dimensions: self.config.dimensions,
            connectivity: self.config.connectivity,
            memory_bytes: self.index.serialized_length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_vector(seed: f32) -> Vec<f32> {
        (0..DEFAULT_DIMENSIONS)
            .map(|i| ((i as f32 + seed) / DEFAULT_DIMENSIONS as f32).sin())
            .collect()
    }

    fn meta(owner: &str) -> VectorMetadata {
        VectorMetadata {
            owner_id: owner.to_string(),
            context_id: None,
        }
    }

    #[test]
    fn index_creation() {
        let index = VectorIndex::new().unwrap();
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
        assert_eq!(index.dimensions(), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn add_and_search() {
        let mut index = VectorIndex::new().unwrap();
        let v1 = create_test_vector(1.0);
        let v2 = create_test_vector(2.0);
        let v3 = create_test_vector(100.0);

        index.add("mem-1", &v1, meta("u1")).unwrap();
        index.add("mem-2", &v2, meta("u1")).unwrap();
        index.add("mem-3", &v3, meta("u1")).unwrap();

        assert_eq!(index.len(), 3);
        assert!(index.contains("mem-1"));
        assert!(!index.contains("mem-999"));

        let results = index.search(&v1, 3).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].0, "mem-1");
        assert!(results[0].1 > 0.0 && results[0].1 <= 1.0);
    }

    #[test]
    fn search_scoped_filters_by_owner() {
        let mut index = VectorIndex::new().unwrap();
        let v1 = create_test_vector(1.0);

        index.add("mine", &v1.clone(), meta("owner-a")).unwrap();
        index.add("theirs", &v1, meta("owner-b")).unwrap();

        let results = index.search_scoped(&create_test_vector(1.0), 10, "owner-a", None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "mine");
    }

    #[test]
    fn remove() {
        let mut index = VectorIndex::new().unwrap();
        let v1 = create_test_vector(1.0);
        index.add("mem-1", &v1, meta("u1")).unwrap();
        assert!(index.contains("mem-1"));
        index.remove("mem-1").unwrap();
        assert!(!index.contains("mem-1"));
    }

    #[test]
    fn update() {
        let mut index = VectorIndex::new().unwrap();
        let v1 = create_test_vector(1.0);
        let v2 = create_test_vector(2.0);
        index.add("mem-1", &v1, meta("u1")).unwrap();
        assert_eq!(index.len(), 1);
        index.add("mem-1", &v2, meta("u1")).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn invalid_dimensions() {
        let mut index = VectorIndex::new().unwrap();
        let wrong_size: Vec<f32> = vec![1.0, 2.0, 3.0];
        assert!(index.add("mem-1", &wrong_size, meta("u1")).is_err());
    }

    #[test]
    fn search_with_threshold_excludes_dissimilar() {
        let mut index = VectorIndex::new().unwrap();
        let v1 = create_test_vector(1.0);
        let v2 = create_test_vector(100.0);
        index.add("similar", &v1.clone(), meta("u1")).unwrap();
        index.add("different", &v2, meta("u1")).unwrap();

        let results = index.search_with_threshold(&v1, 10, 0.9).unwrap();
        assert!(results.iter().any(|(k, _)| k == "similar"));
    }

    #[test]
    fn stats() {
        let mut index = VectorIndex::new().unwrap();
        let v1 = create_test_vector(1.0);
        index.add("mem-1", &v1, meta("u1")).unwrap();
        let stats = index.stats();
        assert_eq!(stats.total_vectors, 1);
        assert_eq!(stats.dimensions, DEFAULT_DIMENSIONS);
    }
}
