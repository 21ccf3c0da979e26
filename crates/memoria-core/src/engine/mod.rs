//! The memory engine: the orchestrator that ties storage, embeddings,
//! the vector index, and the cache together behind one public API.
//!
//! Per-memory writes are serialized through a sharded map of
//! `tokio::sync::Mutex` guards keyed by memory id, so concurrent
//! updates to the same memory can't interleave while updates to
//! different memories still run in parallel. The primary store is the
//! system of record: vector index and cache updates happen after the
//! SQLite write commits and are best-effort.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;

use crate::analysis;
use crate::cache::{self, EngineCache};
use crate::embeddings::EmbeddingProvider;
use crate::error::{EngineError, Result};
use crate::memory::{
    Context, CreateContextInput, CreateMemoryInput, CreateRelationInput, Memory, MemoryStats,
    Relation, ScoredMemory, SearchQuery, SemanticSearchQuery, UpdateMemoryInput,
};
use crate::search::VectorMetadata;
use crate::storage::{Storage, StorageError};

mod locks;
use locks::MemoryLocks;

const AUTO_RELATE_TOP_K: usize = 5;
const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Options accepted by `create_memory`, beyond the stored fields.
#[derive(Debug, Clone, Default)]
pub struct CreateMemoryOptions {
    pub auto_relate: bool,
    pub similarity_threshold: Option<f32>,
}

/// Result of `ingest_knowledge`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub memories_created: usize,
    pub relations_created: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Result of `analyze_knowledge_graph` with `mode = overview`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphOverview {
    pub total_memories: i64,
    pub total_relations: i64,
    pub connectivity_ratio: f64,
    pub top_connected_memories: Vec<ConnectedMemory>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMemory {
    pub id: String,
    pub title: String,
    pub degree: usize,
}

/// Result of `analyze_knowledge_graph` with `mode = centrality`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Centrality {
    pub memory_id: String,
    pub degree: usize,
    pub neighbors: Vec<(String, String)>,
    pub strength_sum: f64,
}

/// Result of `categorize_memories`.
#[derive(Debug, Clone, serde::Serialize, Default)]
pub struct CategoryCounts {
    pub technical: usize,
    pub planning: usize,
    pub ideas: usize,
    pub research: usize,
    pub other: usize,
}

pub struct MemoryEngine {
    storage: Arc<Storage>,
    embeddings: Arc<dyn EmbeddingProvider>,
    vector_index: AsyncMutex<crate::search::VectorIndex>,
    cache: EngineCache,
    locks: MemoryLocks,
}

impl MemoryEngine {
    pub fn new(storage: Arc<Storage>, embeddings: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let vector_index = crate::search::VectorIndex::with_config(crate::search::VectorIndexConfig {
            dimensions: embeddings.dimensions(),
            ..Default::default()
        })
        .map_err(|e| EngineError::StorageFailure(StorageError::Init(e.to_string())))?;

        let cache = EngineCache::new(&storage.config().cache.clone());
        let engine = Self {
            storage,
            embeddings,
            vector_index: AsyncMutex::new(vector_index),
            cache,
            locks: MemoryLocks::new(),
        };
        Ok(engine)
    }

    /// The primary store backing this engine, for callers (the REST
    /// surface's user registration/login) that need repository access
    /// the engine itself doesn't expose as an operation.
    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Races `fut` against the configured per-operation deadline
    /// (`limits.request_timeout_seconds`, default 30s). A timeout
    /// surfaces as `EngineError::DeadlineExceeded` without leaving
    /// partial state: the future is simply dropped, and every write
    /// path it could have been in the middle of commits atomically or
    /// not at all.
    async fn with_deadline<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let deadline = Duration::from_secs(self.storage.config().limits.request_timeout_seconds);
        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::DeadlineExceeded),
        }
    }

    /// Rehydrates the vector index from persisted embedding records.
    /// Called once at startup after construction.
    pub async fn rehydrate_index(&self) -> Result<usize> {
        let records = self.storage.all_embedding_records()?;
        let mut index = self.vector_index.lock().await;
        let mut loaded = 0;
        for (memory_id, _provider_tag, vector) in records {
            let Some(memory) = self.storage.get_memory(&memory_id)? else {
                continue;
            };
            if index
                .add(
                    &memory_id,
                    &vector,
                    VectorMetadata { owner_id: memory.owner_id, context_id: memory.context_id },
                )
                .is_ok()
            {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Re-embeds up to `batch_size` memories whose persisted embedding
    /// record was written by a different provider than the one this
    /// engine currently holds. Returns the number re-embedded, so a
    /// caller can keep calling it on an interval until it returns 0.
    pub async fn reindex_stale_embeddings(&self, batch_size: usize) -> Result<usize> {
        let active_tag = self.embeddings.provider_tag();
        let records = self.storage.all_embedding_records()?;
        let stale: Vec<String> = records
            .into_iter()
            .filter(|(_, provider_tag, _)| provider_tag != active_tag)
            .map(|(memory_id, _, _)| memory_id)
            .take(batch_size)
            .collect();

        let mut reindexed = 0;
        for memory_id in stale {
            let Some(memory) = self.storage.get_memory(&memory_id)? else { continue };
            if !memory.is_active {
                continue;
            }
            self.embed_and_index(&memory).await;
            reindexed += 1;
        }
        Ok(reindexed)
    }

    fn validate_create(input: &CreateMemoryInput) -> Result<()> {
        if input.title.is_empty() || input.title.chars().count() > 500 {
            return Err(EngineError::InvalidInput("title must be 1-500 characters".into()));
        }
        if input.content.len() > 10 * 1024 * 1024 {
            return Err(EngineError::InvalidInput("content exceeds 10 MiB".into()));
        }
        Ok(())
    }

    fn invalidate_owner_caches(&self, owner_id: &str, memory_id: &str) {
        self.cache.invalidate(&cache::memory_key(memory_id));
        self.cache.invalidate_prefix(&format!("sem:{owner_id}:"));
        self.cache.invalidate(&cache::stats_key(owner_id));
    }

    async fn embed_and_index(&self, memory: &Memory) {
        let Ok(embedding) = self.embeddings.embed(&memory.content).await else {
            tracing::warn!(memory_id = %memory.id, "embedding failed, memory stays keyword-searchable only");
            return;
        };
        if let Err(e) = self.storage.upsert_embedding_record(&memory.id, self.embeddings.provider_tag(), &embedding.vector) {
            tracing::warn!(memory_id = %memory.id, error = %e, "failed to persist embedding record");
        }
        let mut index = self.vector_index.lock().await;
        if let Err(e) = index.add(
            &memory.id,
            &embedding.vector,
            VectorMetadata { owner_id: memory.owner_id.clone(), context_id: memory.context_id.clone() },
        ) {
            tracing::warn!(memory_id = %memory.id, error = %e, "failed to upsert vector index entry");
        }
    }

    pub async fn create_memory(&self, input: CreateMemoryInput, options: CreateMemoryOptions) -> Result<Memory> {
        self.with_deadline(self.create_memory_impl(input, options)).await
    }

    async fn create_memory_impl(&self, input: CreateMemoryInput, options: CreateMemoryOptions) -> Result<Memory> {
        Self::validate_create(&input)?;

        if let Some(context_id) = &input.context_id {
            match self.storage.get_context(context_id)? {
                Some(ctx) if ctx.owner_id == input.owner_id => {}
                _ => return Err(EngineError::ContextNotFound(context_id.clone())),
            }
        }

        let owner_id = input.owner_id.clone();
        let memory = self.storage.create_memory(input)?;
        self.invalidate_owner_caches(&owner_id, &memory.id);

        self.embed_and_index(&memory).await;

        if options.auto_relate {
            let threshold = options.similarity_threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);
            if let Ok(hits) = self
                .search_semantic_raw(&owner_id, &memory.content, AUTO_RELATE_TOP_K, None)
                .await
            {
                for (candidate_id, similarity) in hits {
                    if candidate_id == memory.id || similarity < threshold {
                        continue;
                    }
                    let _ = self.storage.create_relation(CreateRelationInput {
                        owner_id: owner_id.clone(),
                        source_id: memory.id.clone(),
                        target_id: candidate_id,
                        relation_type: "similar_to".to_string(),
                        strength: similarity as f64,
                    });
                }
            }
        }

        let _ = self.storage.record_audit(&owner_id, "create_memory", Some(&memory.id));
        Ok(memory)
    }

    pub async fn get_memory(&self, owner_id: &str, id: &str) -> Result<Memory> {
        self.with_deadline(self.get_memory_impl(owner_id, id)).await
    }

    async fn get_memory_impl(&self, owner_id: &str, id: &str) -> Result<Memory> {
        if let Some(cached) = self.cache.get::<Memory>(&cache::memory_key(id)) {
            if cached.owner_id == owner_id {
                return Ok(cached);
            }
        }

        let memory = self.storage.get_memory(id)?.ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        self.check_access(owner_id, &memory)?;
        self.cache.set(&cache::memory_key(id), &memory);
        Ok(memory)
    }

    fn check_access(&self, owner_id: &str, memory: &Memory) -> Result<()> {
        use crate::memory::AccessLevel;
        let allowed = memory.owner_id == owner_id
            || memory.access_level == AccessLevel::Public
            || memory.access_level == AccessLevel::Shared;
        if allowed {
            Ok(())
        } else {
            Err(EngineError::AccessDenied(owner_id.to_string()))
        }
    }

    pub async fn update_memory(&self, owner_id: &str, id: &str, patch: UpdateMemoryInput) -> Result<Memory> {
        self.with_deadline(self.update_memory_impl(owner_id, id, patch)).await
    }

    async fn update_memory_impl(&self, owner_id: &str, id: &str, patch: UpdateMemoryInput) -> Result<Memory> {
        let _guard = self.locks.lock(id).await;

        let existing = self.storage.get_memory(id)?.ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        if existing.owner_id != owner_id {
            return Err(EngineError::AccessDenied(owner_id.to_string()));
        }

        let content_changed = patch.content.is_some();
        let updated = self
            .storage
            .update_memory(id, patch)?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;

        self.invalidate_owner_caches(owner_id, id);

        if content_changed {
            self.embed_and_index(&updated).await;
        }

        let _ = self.storage.record_audit(owner_id, "update_memory", Some(id));
        Ok(updated)
    }

    pub async fn delete_memory(&self, owner_id: &str, id: &str) -> Result<()> {
        self.with_deadline(self.delete_memory_impl(owner_id, id)).await
    }

    async fn delete_memory_impl(&self, owner_id: &str, id: &str) -> Result<()> {
        let _guard = self.locks.lock(id).await;

        let existing = self.storage.get_memory(id)?.ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        if existing.owner_id != owner_id {
            return Err(EngineError::AccessDenied(owner_id.to_string()));
        }

        self.storage.delete_memory(id)?;
        self.storage.delete_relations_for_memory(id)?;
        self.invalidate_owner_caches(owner_id, id);

        let mut index = self.vector_index.lock().await;
        if let Err(e) = index.remove(id) {
            tracing::warn!(memory_id = %id, error = %e, "failed to remove vector index entry");
        }
        drop(index);

        let _ = self.storage.record_audit(owner_id, "delete_memory", Some(id));
        Ok(())
    }

    pub fn search_memories(&self, query: &SearchQuery) -> Result<Vec<Memory>> {
        Ok(self.storage.search_memories(query)?)
    }

    /// Raw `(id, similarity)` pairs for a semantic query, used both by
    /// `search_semantic` and by `create_memory`'s auto-relate step.
    async fn search_semantic_raw(
        &self,
        owner_id: &str,
        query_text: &str,
        top_k: usize,
        context_id: Option<&str>,
    ) -> Result<Vec<(String, f32)>> {
        let embedding = self
            .embeddings
            .embed(query_text)
            .await
            .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
        let index = self.vector_index.lock().await;
        index
            .search_scoped(&embedding.vector, top_k, owner_id, context_id)
            .map_err(|e| EngineError::StorageFailure(StorageError::Init(e.to_string())))
    }

    pub async fn search_semantic(&self, query: SemanticSearchQuery) -> Result<Vec<ScoredMemory>> {
        self.with_deadline(self.search_semantic_impl(query)).await
    }

    async fn search_semantic_impl(&self, query: SemanticSearchQuery) -> Result<Vec<ScoredMemory>> {
        let threshold = query.min_similarity.unwrap_or(0.0);
        let cache_key = cache::semantic_key(
            &query.owner_id,
            &format!("{}|{}|{}|{:?}", query.query, query.top_k, threshold, query.context_id),
        );

        if let Some(cached) = self.cache.get::<Vec<ScoredMemory>>(&cache_key) {
            return Ok(cached);
        }

        let hits = self
            .search_semantic_raw(&query.owner_id, &query.query, query.top_k, query.context_id.as_deref())
            .await?;

        let mut scored = Vec::with_capacity(hits.len());
        for (id, similarity) in hits {
            if similarity < threshold {
                continue;
            }
            if let Some(memory) = self.storage.get_memory(&id)? {
                scored.push(ScoredMemory { memory, similarity });
            }
        }

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.memory.importance.cmp(&a.memory.importance))
                .then_with(|| b.memory.updated_at.cmp(&a.memory.updated_at))
                .then_with(|| a.memory.id.cmp(&b.memory.id))
        });
        scored.truncate(query.top_k);

        self.cache.set(&cache_key, &scored);
        Ok(scored)
    }

    pub fn create_context(&self, input: CreateContextInput) -> Result<Context> {
        Ok(self.storage.create_context(input)?)
    }

    pub fn get_context(&self, owner_id: &str, id: &str) -> Result<Context> {
        let ctx = self.storage.get_context(id)?.ok_or_else(|| EngineError::ContextNotFound(id.to_string()))?;
        if ctx.owner_id != owner_id {
            return Err(EngineError::AccessDenied(owner_id.to_string()));
        }
        Ok(ctx)
    }

    /// Public contract for this release; not implemented (§4.5).
    pub fn update_context(&self, _owner_id: &str, _id: &str) -> Result<Context> {
        Err(EngineError::NotImplemented("context update is not implemented in this release"))
    }

    /// Public contract for this release; not implemented (§4.5).
    pub fn delete_context(&self, _owner_id: &str, _id: &str) -> Result<()> {
        Err(EngineError::NotImplemented("context delete is not implemented in this release"))
    }

    pub fn create_relation(&self, input: CreateRelationInput) -> Result<Relation> {
        let mut input = input;
        input.strength = input.strength.clamp(0.0, 1.0);

        let source = self.storage.get_memory(&input.source_id)?.ok_or_else(|| EngineError::NotFound(input.source_id.clone()))?;
        let target = self.storage.get_memory(&input.target_id)?.ok_or_else(|| EngineError::NotFound(input.target_id.clone()))?;
        if source.owner_id != input.owner_id || target.owner_id != input.owner_id {
            return Err(EngineError::AccessDenied(input.owner_id.clone()));
        }

        let relation = self.storage.create_relation(input)?;
        Ok(relation)
    }

    pub fn bulk_create_relations(&self, inputs: Vec<CreateRelationInput>) -> Result<Vec<Relation>> {
        const BATCH_SIZE: usize = 100;
        let mut created = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(BATCH_SIZE) {
            for input in batch {
                created.push(self.create_relation(input.clone())?);
            }
        }
        Ok(created)
    }

    pub fn get_memory_relations(&self, owner_id: &str, memory_id: &str) -> Result<Vec<Relation>> {
        let memory = self.storage.get_memory(memory_id)?.ok_or_else(|| EngineError::NotFound(memory_id.to_string()))?;
        if memory.owner_id != owner_id {
            return Err(EngineError::AccessDenied(owner_id.to_string()));
        }
        Ok(self.storage.get_memory_relations(memory_id)?)
    }

    pub fn get_memory_statistics(&self, owner_id: &str) -> Result<MemoryStats> {
        if let Some(cached) = self.cache.get::<MemoryStats>(&cache::stats_key(owner_id)) {
            return Ok(cached);
        }
        let stats = self.storage.get_memory_statistics(owner_id)?;
        self.cache.set(&cache::stats_key(owner_id), &stats);
        Ok(stats)
    }

    /// Splits `bytes` into chapters by heuristics (leading `# `,
    /// `Chapter N`, or form-feed), one Memory per chapter, chained
    /// with `follows` relations in chapter order.
    pub async fn ingest_knowledge(
        &self,
        owner_id: &str,
        bytes: &[u8],
        title: Option<String>,
        context_id: Option<String>,
    ) -> Result<IngestResult> {
        let text = decode_with_fallback(bytes).ok_or_else(|| EngineError::EncodingUnknown("unable to decode input as UTF-8, Latin-1, or CP-1252".to_string()))?;

        let chapters = split_chapters(&text);
        let mut memories_created = 0;
        let mut relations_created = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();
        let mut previous_id: Option<String> = None;

        for (idx, chapter) in chapters.iter().enumerate() {
            let trimmed = chapter.trim();
            if trimmed.is_empty() {
                skipped += 1;
                continue;
            }
            if trimmed.len() > 1024 * 1024 {
                skipped += 1;
                continue;
            }

            let chapter_title = title
                .clone()
                .map(|t| format!("{t} — part {}", idx + 1))
                .unwrap_or_else(|| format!("Chapter {}", idx + 1));

            let input = CreateMemoryInput {
                owner_id: owner_id.to_string(),
                context_id: context_id.clone(),
                title: chapter_title,
                content: trimmed.to_string(),
                access_level: Default::default(),
                importance: 5,
                category: None,
                tags: vec!["ingested".to_string()],
                metadata: Default::default(),
            };

            match self.create_memory(input, CreateMemoryOptions::default()).await {
                Ok(memory) => {
                    memories_created += 1;
                    if let Some(prev) = &previous_id {
                        let rel = CreateRelationInput {
                            owner_id: owner_id.to_string(),
                            source_id: prev.clone(),
                            target_id: memory.id.clone(),
                            relation_type: "follows".to_string(),
                            strength: 1.0,
                        };
                        if self.create_relation(rel).is_ok() {
                            relations_created += 1;
                        }
                    }
                    previous_id = Some(memory.id);
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        Ok(IngestResult { memories_created, relations_created, skipped, errors })
    }

    pub fn analyze_knowledge_graph_overview(&self, owner_id: &str) -> Result<GraphOverview> {
        let ids = self.storage.list_all_active_memory_ids(owner_id)?;
        let relations = self.storage.list_relations_for_owner(owner_id)?;

        let vertex_count = ids.len();
        let edge_count = relations.len();
        let connectivity_ratio = if vertex_count > 1 {
            (2.0 * edge_count as f64) / (vertex_count as f64 * (vertex_count as f64 - 1.0))
        } else {
            0.0
        };

        let mut degree: HashMap<String, usize> = HashMap::new();
        for relation in &relations {
            *degree.entry(relation.source_id.clone()).or_insert(0) += 1;
            *degree.entry(relation.target_id.clone()).or_insert(0) += 1;
        }

        let mut ranked: Vec<(String, usize)> = degree.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(5);

        let mut top_connected_memories = Vec::with_capacity(ranked.len());
        for (id, deg) in ranked {
            if let Some(memory) = self.storage.get_memory(&id)? {
                top_connected_memories.push(ConnectedMemory { id, title: memory.title, degree: deg });
            }
        }

        Ok(GraphOverview {
            total_memories: vertex_count as i64,
            total_relations: edge_count as i64,
            connectivity_ratio,
            top_connected_memories,
        })
    }

    pub fn analyze_knowledge_graph_centrality(&self, owner_id: &str, focus_memory_id: &str) -> Result<Centrality> {
        let memory = self.storage.get_memory(focus_memory_id)?.ok_or_else(|| EngineError::NotFound(focus_memory_id.to_string()))?;
        if memory.owner_id != owner_id {
            return Err(EngineError::AccessDenied(owner_id.to_string()));
        }

        let relations = self.storage.get_memory_relations(focus_memory_id)?;
        let mut neighbors = Vec::with_capacity(relations.len());
        let mut strength_sum = 0.0;
        for relation in &relations {
            strength_sum += relation.strength;
            let neighbor_id = if relation.source_id == focus_memory_id { &relation.target_id } else { &relation.source_id };
            if let Some(neighbor) = self.storage.get_memory(neighbor_id)? {
                neighbors.push((neighbor.id, neighbor.title));
            }
        }

        Ok(Centrality {
            memory_id: focus_memory_id.to_string(),
            degree: relations.len(),
            neighbors,
            strength_sum,
        })
    }

    pub fn analyze_knowledge_graph_connections(&self, owner_id: &str) -> Result<Vec<(String, String, String, f64)>> {
        Ok(self
            .storage
            .list_relations_for_owner(owner_id)?
            .into_iter()
            .map(|r| (r.source_id, r.target_id, r.relation_type, r.strength))
            .collect())
    }

    fn concat_owner_content(&self, owner_id: &str, ids: Option<&[String]>) -> Result<String> {
        let memory_ids = match ids {
            Some(ids) => ids.to_vec(),
            None => self.storage.list_all_active_memory_ids(owner_id)?,
        };
        let mut buf = String::new();
        for id in memory_ids {
            if let Some(memory) = self.storage.get_memory(&id)? {
                if memory.owner_id != owner_id {
                    continue;
                }
                buf.push_str(&memory.content);
                buf.push('\n');
            }
        }
        Ok(buf)
    }

    pub fn analyze_content_keywords(&self, owner_id: &str, ids: Option<&[String]>, top_n: usize) -> Result<Vec<(String, usize)>> {
        let text = self.concat_owner_content(owner_id, ids)?;
        Ok(analysis::top_keywords(&text, top_n))
    }

    pub fn analyze_content_sentiment(&self, owner_id: &str, ids: Option<&[String]>) -> Result<analysis::SentimentResult> {
        let text = self.concat_owner_content(owner_id, ids)?;
        Ok(analysis::sentiment(&text))
    }

    pub fn analyze_content_complexity(&self, owner_id: &str, ids: Option<&[String]>) -> Result<f64> {
        let text = self.concat_owner_content(owner_id, ids)?;
        Ok(analysis::complexity(&text))
    }

    pub fn analyze_content_readability(&self, owner_id: &str, ids: Option<&[String]>) -> Result<f64> {
        let text = self.concat_owner_content(owner_id, ids)?;
        Ok(analysis::readability(&text))
    }

    pub fn summarize_memory(&self, owner_id: &str, id: &str, max_chars: usize) -> Result<String> {
        let memory = self.storage.get_memory(id)?.ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        if memory.owner_id != owner_id {
            return Err(EngineError::AccessDenied(owner_id.to_string()));
        }
        Ok(analysis::summarize(&memory.content, max_chars))
    }

    pub fn categorize_memories(&self, owner_id: &str, auto_generate_tags: bool) -> Result<CategoryCounts> {
        let ids = self.storage.list_all_active_memory_ids(owner_id)?;
        let mut counts = CategoryCounts::default();

        for id in ids {
            let Some(memory) = self.storage.get_memory(&id)? else { continue };
            let category = analysis::categorize(&memory.content);
            match category {
                analysis::MemoryCategory::Technical => counts.technical += 1,
                analysis::MemoryCategory::Planning => counts.planning += 1,
                analysis::MemoryCategory::Ideas => counts.ideas += 1,
                analysis::MemoryCategory::Research => counts.research += 1,
                analysis::MemoryCategory::Other => counts.other += 1,
            }

            if auto_generate_tags {
                let mut tags = memory.tags.clone();
                let tag = category.as_str().to_string();
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
                let patch = UpdateMemoryInput {
                    category: Some(category.as_str().to_string()),
                    tags: Some(tags),
                    ..Default::default()
                };
                let _ = self.storage.update_memory(&id, patch);
                self.invalidate_owner_caches(owner_id, &id);
            }
        }

        Ok(counts)
    }
}

fn decode_with_fallback(bytes: &[u8]) -> Option<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(s.to_string());
    }

    for encoding in [latin1_decode, cp1252_decode] {
        let candidate = encoding(bytes);
        let replacement_count = candidate.matches('\u{FFFD}').count();
        if replacement_count * 100 <= candidate.chars().count() {
            return Some(candidate);
        }
    }
    None
}

fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn cp1252_decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80 => '\u{20AC}',
            0x82..=0x8C | 0x91..=0x9C | 0x9E | 0x9F => b as char,
            _ => b as char,
        })
        .collect()
}

fn split_chapters(text: &str) -> Vec<String> {
    if text.contains('\u{000C}') {
        return text.split('\u{000C}').map(|s| s.to_string()).collect();
    }

    let mut chapters = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        let is_heading = line.starts_with("# ") || line.trim_start().to_lowercase().starts_with("chapter ");
        if is_heading && !current.trim().is_empty() {
            chapters.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        chapters.push(current);
    }
    if chapters.is_empty() {
        chapters.push(text.to_string());
    }
    chapters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::LocalEmbeddingProvider;
    use crate::memory::AccessLevel;

    fn test_engine() -> (MemoryEngine, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = crate::config::Config::default();
        config.data_dir = dir.path().to_path_buf();
        let storage = Arc::new(Storage::new(config).unwrap());
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(LocalEmbeddingProvider::new());
        (MemoryEngine::new(storage, embeddings).unwrap(), dir)
    }

    fn test_engine_with_timeout(seconds: u64) -> (MemoryEngine, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = crate::config::Config::default();
        config.data_dir = dir.path().to_path_buf();
        config.limits.request_timeout_seconds = seconds;
        let storage = Arc::new(Storage::new(config).unwrap());
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(LocalEmbeddingProvider::new());
        (MemoryEngine::new(storage, embeddings).unwrap(), dir)
    }

    fn input(owner: &str, title: &str, content: &str) -> CreateMemoryInput {
        CreateMemoryInput {
            owner_id: owner.to_string(),
            context_id: None,
            title: title.to_string(),
            content: content.to_string(),
            access_level: AccessLevel::Private,
            importance: 5,
            category: None,
            tags: vec![],
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn create_and_get_memory() {
        let (engine, _dir) = test_engine();
        let memory = engine
            .create_memory(input("u1", "title", "rust ownership rules"), CreateMemoryOptions::default())
            .await
            .unwrap();

        let fetched = engine.get_memory("u1", &memory.id).await.unwrap();
        assert_eq!(fetched.content, "rust ownership rules");
    }

    #[tokio::test]
    async fn get_memory_denies_other_owners() {
        let (engine, _dir) = test_engine();
        let memory = engine
            .create_memory(input("u1", "title", "secret"), CreateMemoryOptions::default())
            .await
            .unwrap();

        let err = engine.get_memory("u2", &memory.id).await.unwrap_err();
        assert!(matches!(err, EngineError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn update_memory_reembeds_on_content_change() {
        let (engine, _dir) = test_engine();
        let memory = engine
            .create_memory(input("u1", "title", "original content"), CreateMemoryOptions::default())
            .await
            .unwrap();

        let updated = engine
            .update_memory(
                "u1",
                &memory.id,
                UpdateMemoryInput { content: Some("new content".to_string()), ..Default::default() },
            )
            .await
            .unwrap();

        assert_eq!(updated.content, "new content");
    }

    #[tokio::test]
    async fn semantic_search_finds_similar_memory() {
        let (engine, _dir) = test_engine();
        engine
            .create_memory(input("u1", "a", "rust ownership and borrowing rules"), CreateMemoryOptions::default())
            .await
            .unwrap();
        engine
            .create_memory(input("u1", "b", "weather forecast for tomorrow"), CreateMemoryOptions::default())
            .await
            .unwrap();

        let results = engine
            .search_semantic(SemanticSearchQuery {
                owner_id: "u1".to_string(),
                query: "rust borrow checker".to_string(),
                top_k: 5,
                context_id: None,
                min_similarity: None,
            })
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].memory.title, "a");
    }

    #[tokio::test]
    async fn delete_memory_removes_from_search() {
        let (engine, _dir) = test_engine();
        let memory = engine
            .create_memory(input("u1", "title", "content"), CreateMemoryOptions::default())
            .await
            .unwrap();

        engine.delete_memory("u1", &memory.id).await.unwrap();
        let err = engine.get_memory("u1", &memory.id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn with_deadline_surfaces_deadline_exceeded_without_running_the_future_to_completion() {
        let (engine, _dir) = test_engine_with_timeout(1);
        let result: Result<()> = engine
            .with_deadline(async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(EngineError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn with_deadline_passes_through_a_future_that_finishes_in_time() {
        let (engine, _dir) = test_engine_with_timeout(30);
        let result = engine.with_deadline(async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn ingest_knowledge_splits_on_headings() {
        let (engine, _dir) = test_engine();
        let text = b"# Chapter One\nfirst chapter content.\n# Chapter Two\nsecond chapter content.";
        let result = engine.ingest_knowledge("u1", text, None, None).await.unwrap();
        assert_eq!(result.memories_created, 2);
        assert_eq!(result.relations_created, 1);
    }

    #[tokio::test]
    async fn categorize_memories_counts_by_lexicon() {
        let (engine, _dir) = test_engine();
        engine
            .create_memory(input("u1", "a", "fix the bug in the api endpoint"), CreateMemoryOptions::default())
            .await
            .unwrap();
        engine
            .create_memory(input("u1", "b", "plan the roadmap for next sprint"), CreateMemoryOptions::default())
            .await
            .unwrap();

        let counts = engine.categorize_memories("u1", true).unwrap();
        assert_eq!(counts.technical, 1);
        assert_eq!(counts.planning, 1);
    }

    #[test]
    fn context_update_and_delete_are_not_implemented() {
        let (engine, _dir) = test_engine();
        assert!(matches!(engine.update_context("u1", "x"), Err(EngineError::NotImplemented(_))));
        assert!(matches!(engine.delete_context("u1", "x"), Err(EngineError::NotImplemented(_))));
    }
}
