//! SQLite-backed storage.
//!
//! Uses separate reader/writer connections for interior mutability. All
//! methods take `&self` (not `&mut self`), making `Storage` `Send + Sync`
//! so callers can share it as `Arc<Storage>` instead of
//! `Arc<Mutex<Storage>>`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::memory::{
    AccessLevel, Codec, Context, CreateContextInput, CreateMemoryInput,
    CreateRelationInput, Memory, MemoryStats, Relation, SearchQuery, UpdateMemoryInput, User,
};
use crate::search::sanitize_fts5_query;
use crate::strategies::{self, StrategyError};

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("initialization error: {0}")]
    Init(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("corrupted payload: {0}")]
    Corrupted(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    config: crate::config::Config,
}

impl Storage {
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA mmap_size = 268435456;
             PRAGMA journal_size_limit = 67108864;
             PRAGMA optimize = 0x10002;",
        )?;
        Ok(())
    }

    /// Open (creating if needed) the SQLite database under
    /// `config.data_dir`, applying migrations on the writer connection.
    pub fn new(config: crate::config::Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            let _ = std::fs::set_permissions(&config.data_dir, perms);
        }

        let path = config.data_dir.join("memoria.db");

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            config,
        })
    }

    /// Open a storage instance at an explicit path, ignoring
    /// `config.data_dir` — used by tests and the CLI's `--data-dir` flag.
    pub fn new_at_path(path: &Path, config: crate::config::Config) -> Result<Self> {
        let mut config = config;
        config.data_dir = path.to_path_buf();
        Self::new(config)
    }

    pub fn config(&self) -> &crate::config::Config {
        &self.config
    }

    fn writer(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.writer.lock().expect("writer lock poisoned")
    }

    fn reader(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.reader.lock().expect("reader lock poisoned")
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.writer().execute(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, username, password_hash, now.to_rfc3339()],
        )?;
        Ok(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.reader()
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
                params![username],
                Self::row_to_user,
            )
            .optional()
            .map_err(StorageError::from)
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.reader()
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE id = ?1",
                params![id],
                Self::row_to_user,
            )
            .optional()
            .map_err(StorageError::from)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let created_at: String = row.get(3)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: parse_timestamp(&created_at),
        })
    }

    // ------------------------------------------------------------------
    // Contexts
    // ------------------------------------------------------------------

    pub fn create_context(&self, input: CreateContextInput) -> Result<Context> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.writer().execute(
            "INSERT INTO contexts (id, owner_id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, input.owner_id, input.name, input.description, now.to_rfc3339()],
        )?;
        Ok(Context {
            id,
            owner_id: input.owner_id,
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_context(&self, id: &str) -> Result<Option<Context>> {
        self.reader()
            .query_row(
                "SELECT id, owner_id, name, description, created_at, updated_at FROM contexts WHERE id = ?1",
                params![id],
                Self::row_to_context,
            )
            .optional()
            .map_err(StorageError::from)
    }

    fn row_to_context(row: &rusqlite::Row) -> rusqlite::Result<Context> {
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;
        Ok(Context {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    // ------------------------------------------------------------------
    // Memories
    // ------------------------------------------------------------------

    pub fn create_memory(&self, input: CreateMemoryInput) -> Result<Memory> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let original_byte_length = input.content.len() as i64;
        let encoded = strategies::encode(input.content.as_bytes(), &self.config.compression)?;
        let stored_bytes_total = encoded.bytes.len() as i64;
        let chunks = strategies::chunk(&encoded.bytes, input.content.len(), &self.config.chunking);
        let chunk_count = chunks.as_ref().map(|c| c.len()).unwrap_or(0) as i64;

        let tags_json = serde_json::to_string(&input.tags).unwrap_or_else(|_| "[]".to_string());
        let metadata_json = serde_json::to_string(&input.metadata).unwrap_or_else(|_| "{}".to_string());

        let writer = self.writer();
        writer.execute(
            "INSERT INTO memories (
                id, owner_id, context_id, title, content, content_hash, codec,
                access_level, is_active, importance, category, tags, summary,
                metadata, chunk_count, original_byte_length, stored_bytes_total,
                created_at, updated_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,1,?9,?10,?11,NULL,?12,?13,?14,?15,?16,?16)",
            params![
                id,
                input.owner_id,
                input.context_id,
                input.title,
                encoded.bytes,
                encoded.content_hash,
                encoded.codec.as_str(),
                input.access_level.as_str(),
                input.importance,
                input.category,
                tags_json,
                metadata_json,
                chunk_count,
                original_byte_length,
                stored_bytes_total,
                now.to_rfc3339(),
            ],
        )?;

        if let Some(chunks) = &chunks {
            for (seq, chunk) in chunks.iter().enumerate() {
                writer.execute(
                    "INSERT INTO memory_chunks (memory_id, sequence, data, byte_len) VALUES (?1,?2,?3,?4)",
                    params![id, seq as i64, chunk, chunk.len() as i64],
                )?;
            }
        }
        drop(writer);

        Ok(Memory {
            id,
            owner_id: input.owner_id,
            context_id: input.context_id,
            title: input.title,
            content: input.content,
            content_hash: encoded.content_hash,
            access_level: input.access_level,
            is_active: true,
            importance: input.importance,
            category: input.category,
            tags: input.tags,
            summary: None,
            metadata: input.metadata,
            codec: encoded.codec,
            chunk_count,
            original_byte_length,
            stored_bytes_total,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_memory(&self, id: &str) -> Result<Option<Memory>> {
        let reader = self.reader();
        let row = reader
            .query_row(
                "SELECT id, owner_id, context_id, title, content, content_hash, codec,
                        access_level, is_active, importance, category, tags, summary,
                        metadata, chunk_count, created_at, updated_at,
                        original_byte_length, stored_bytes_total
                 FROM memories WHERE id = ?1 AND is_active = 1",
                params![id],
                Self::row_to_memory_raw,
            )
            .optional()?;
        drop(reader);

        match row {
            Some(raw) => Ok(Some(self.materialize_memory(raw)?)),
            None => Ok(None),
        }
    }

    /// Reassembles chunked content and decompresses it.
    fn materialize_memory(&self, raw: RawMemoryRow) -> Result<Memory> {
        let body = if raw.chunk_count > 0 {
            let reader = self.reader();
            let mut stmt = reader.prepare(
                "SELECT data FROM memory_chunks WHERE memory_id = ?1 ORDER BY sequence ASC",
            )?;
            let chunks: Vec<Vec<u8>> = stmt
                .query_map(params![raw.id], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;
            chunks.into_iter().flatten().collect()
        } else {
            raw.content
        };

        let codec = Codec::parse_name(&raw.codec).unwrap_or(Codec::None);
        let decoded = strategies::decode(&body, codec)
            .map_err(|e| StorageError::Corrupted(format!("memory {}: {e}", raw.id)))?;
        if strategies::content_hash(&decoded) != raw.content_hash {
            return Err(StorageError::Corrupted(format!(
                "memory {}: content hash mismatch, stored bytes do not match content_hash",
                raw.id
            )));
        }
        let content = String::from_utf8_lossy(&decoded).into_owned();

        Ok(Memory {
            id: raw.id,
            owner_id: raw.owner_id,
            context_id: raw.context_id,
            title: raw.title,
            content,
            content_hash: raw.content_hash,
            access_level: AccessLevel::parse_name(&raw.access_level).unwrap_or_default(),
            is_active: raw.is_active,
            importance: raw.importance,
            category: raw.category,
            tags: serde_json::from_str(&raw.tags).unwrap_or_default(),
            summary: raw.summary,
            metadata: serde_json::from_str(&raw.metadata).unwrap_or_default(),
            codec,
            chunk_count: raw.chunk_count,
            original_byte_length: raw.original_byte_length,
            stored_bytes_total: raw.stored_bytes_total,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }

    fn row_to_memory_raw(row: &rusqlite::Row) -> rusqlite::Result<RawMemoryRow> {
        let created_at: String = row.get(15)?;
        let updated_at: String = row.get(16)?;
        Ok(RawMemoryRow {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            context_id: row.get(2)?,
            title: row.get(3)?,
            content: row.get(4)?,
            content_hash: row.get(5)?,
            codec: row.get(6)?,
            access_level: row.get(7)?,
            is_active: row.get::<_, i64>(8)? != 0,
            importance: row.get(9)?,
            category: row.get(10)?,
            tags: row.get(11)?,
            summary: row.get(12)?,
            metadata: row.get(13)?,
            chunk_count: row.get(14)?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
            original_byte_length: row.get(17)?,
            stored_bytes_total: row.get(18)?,
        })
    }

    pub fn update_memory(&self, id: &str, patch: UpdateMemoryInput) -> Result<Option<Memory>> {
        let Some(existing) = self.get_memory(id)? else {
            return Ok(None);
        };

        let title = patch.title.unwrap_or(existing.title);
        let content = patch.content.unwrap_or(existing.content);
        let access_level = patch.access_level.unwrap_or(existing.access_level);
        let importance = patch.importance.unwrap_or(existing.importance);
        let category = patch.category.or(existing.category);
        let tags = patch.tags.unwrap_or(existing.tags);
        let summary = patch.summary.or(existing.summary);
        let metadata = patch.metadata.unwrap_or(existing.metadata);
        let is_active = patch.is_active.unwrap_or(existing.is_active);
        let now = Utc::now();

        let original_byte_length = content.len() as i64;
        let encoded = strategies::encode(content.as_bytes(), &self.config.compression)?;
        let stored_bytes_total = encoded.bytes.len() as i64;
        let chunks = strategies::chunk(&encoded.bytes, content.len(), &self.config.chunking);
        let chunk_count = chunks.as_ref().map(|c| c.len()).unwrap_or(0) as i64;

        let tags_json = serde_json::to_string(&tags).unwrap_or_else(|_| "[]".to_string());
        let metadata_json = serde_json::to_string(&metadata).unwrap_or_else(|_| "{}".to_string());

        let writer = self.writer();
        writer.execute(
            "UPDATE memories SET title=?1, content=?2, content_hash=?3, codec=?4,
                access_level=?5, importance=?6, category=?7, tags=?8, summary=?9,
                metadata=?10, chunk_count=?11, is_active=?12, updated_at=?13,
                original_byte_length=?14, stored_bytes_total=?15
             WHERE id=?16",
            params![
                title,
                encoded.bytes,
                encoded.content_hash,
                encoded.codec.as_str(),
                access_level.as_str(),
                importance,
                category,
                tags_json,
                summary,
                metadata_json,
                chunk_count,
                is_active as i64,
                now.to_rfc3339(),
                original_byte_length,
                stored_bytes_total,
                id,
            ],
        )?;
        writer.execute("DELETE FROM memory_chunks WHERE memory_id = ?1", params![id])?;
        if let Some(chunks) = &chunks {
            for (seq, chunk) in chunks.iter().enumerate() {
                writer.execute(
                    "INSERT INTO memory_chunks (memory_id, sequence, data, byte_len) VALUES (?1,?2,?3,?4)",
                    params![id, seq as i64, chunk, chunk.len() as i64],
                )?;
            }
        }
        drop(writer);

        Ok(Some(Memory {
            id: id.to_string(),
            owner_id: existing.owner_id,
            context_id: existing.context_id,
            title,
            content,
            content_hash: encoded.content_hash,
            access_level,
            is_active,
            importance,
            category,
            tags,
            summary,
            metadata,
            codec: encoded.codec,
            chunk_count,
            original_byte_length,
            stored_bytes_total,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Soft-deletes a memory (sets `is_active = 0`). Callers that need a
    /// hard delete can follow up with `purge_memory`.
    pub fn delete_memory(&self, id: &str) -> Result<bool> {
        let affected = self.writer().execute(
            "UPDATE memories SET is_active = 0, updated_at = ?2 WHERE id = ?1",
            params![id, Utc::now().to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    pub fn purge_memory(&self, id: &str) -> Result<bool> {
        let affected = self.writer().execute("DELETE FROM memories WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Keyword/filter search over a single owner's memories.
    pub fn search_memories(&self, query: &SearchQuery) -> Result<Vec<Memory>> {
        let limit = query.limit.unwrap_or(20).clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);

        let reader = self.reader();
        let ids: Vec<String> = if let Some(text) = query.query.as_ref().filter(|q| !q.trim().is_empty()) {
            let sanitized = sanitize_fts5_query(text);
            let mut stmt = reader.prepare(
                "SELECT m.id FROM memories_fts f
                 JOIN memories m ON m.id = f.memory_id
                 WHERE memories_fts MATCH ?1 AND m.owner_id = ?2 AND m.is_active = 1
                 ORDER BY rank LIMIT ?3 OFFSET ?4",
            )?;
            stmt.query_map(params![sanitized, query.owner_id, limit, offset], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?
        } else {
            let mut stmt = reader.prepare(
                "SELECT id FROM memories WHERE owner_id = ?1 AND is_active = 1
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            )?;
            stmt.query_map(params![query.owner_id, limit, offset], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?
        };
        drop(reader);

        let mut memories = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(memory) = self.get_memory(&id)? {
                if let Some(ctx) = &query.context_id {
                    if memory.context_id.as_deref() != Some(ctx.as_str()) {
                        continue;
                    }
                }
                if let Some(category) = &query.category {
                    if memory.category.as_deref() != Some(category.as_str()) {
                        continue;
                    }
                }
                if let Some(tags) = &query.tags {
                    if !tags.iter().any(|t| memory.tags.contains(t)) {
                        continue;
                    }
                }
                memories.push(memory);
            }
        }

        Ok(memories)
    }

    pub fn list_all_active_memory_ids(&self, owner_id: &str) -> Result<Vec<String>> {
        let reader = self.reader();
        let mut stmt =
            reader.prepare("SELECT id FROM memories WHERE owner_id = ?1 AND is_active = 1")?;
        let ids = stmt
            .query_map(params![owner_id], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(ids)
    }

    pub fn get_memory_statistics(&self, owner_id: &str) -> Result<MemoryStats> {
        let reader = self.reader();
        let (total, active, avg_importance, oldest, newest): (i64, i64, f64, Option<String>, Option<String>) = reader.query_row(
            "SELECT COUNT(*), SUM(is_active), COALESCE(AVG(importance), 0.0),
                    MIN(created_at), MAX(created_at)
             FROM memories WHERE owner_id = ?1",
            params![owner_id],
            |row| Ok((row.get(0)?, row.get::<_, Option<i64>>(1)?.unwrap_or(0), row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;

        let total_contexts: i64 = reader.query_row(
            "SELECT COUNT(*) FROM contexts WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;

        let total_relations: i64 = reader.query_row(
            "SELECT COUNT(*) FROM relations WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;

        let memories_with_embeddings: i64 = reader.query_row(
            "SELECT COUNT(*) FROM embedding_records e
             JOIN memories m ON m.id = e.memory_id WHERE m.owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;

        Ok(MemoryStats {
            total_memories: total,
            active_memories: active,
            total_contexts,
            total_relations,
            average_importance: avg_importance,
            oldest_memory: oldest.map(|s| parse_timestamp(&s)),
            newest_memory: newest.map(|s| parse_timestamp(&s)),
            memories_with_embeddings,
        })
    }

    // ------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------

    pub fn create_relation(&self, input: CreateRelationInput) -> Result<Relation> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.writer().execute(
            "INSERT INTO relations (id, owner_id, source_id, target_id, relation_type, strength, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7)
             ON CONFLICT(source_id, target_id, relation_type) DO UPDATE SET strength = excluded.strength",
            params![id, input.owner_id, input.source_id, input.target_id, input.relation_type, input.strength, now.to_rfc3339()],
        )?;
        Ok(Relation {
            id,
            owner_id: input.owner_id,
            source_id: input.source_id,
            target_id: input.target_id,
            relation_type: input.relation_type,
            strength: input.strength,
            created_at: now,
        })
    }

    pub fn get_memory_relations(&self, memory_id: &str) -> Result<Vec<Relation>> {
        let reader = self.reader();
        let mut stmt = reader.prepare(
            "SELECT id, owner_id, source_id, target_id, relation_type, strength, created_at
             FROM relations WHERE source_id = ?1 OR target_id = ?1",
        )?;
        let relations = stmt
            .query_map(params![memory_id], Self::row_to_relation)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(relations)
    }

    pub fn list_relations_for_owner(&self, owner_id: &str) -> Result<Vec<Relation>> {
        let reader = self.reader();
        let mut stmt = reader.prepare(
            "SELECT id, owner_id, source_id, target_id, relation_type, strength, created_at
             FROM relations WHERE owner_id = ?1",
        )?;
        let relations = stmt
            .query_map(params![owner_id], Self::row_to_relation)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(relations)
    }

    /// Drops every relation with `memory_id` as either endpoint. Memory
    /// deletion is soft (the row and its chunks survive for a future
    /// undo), but relations do not get that grace period.
    pub fn delete_relations_for_memory(&self, memory_id: &str) -> Result<usize> {
        let affected = self.writer().execute(
            "DELETE FROM relations WHERE source_id = ?1 OR target_id = ?1",
            params![memory_id],
        )?;
        Ok(affected)
    }

    fn row_to_relation(row: &rusqlite::Row) -> rusqlite::Result<Relation> {
        let created_at: String = row.get(6)?;
        Ok(Relation {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            source_id: row.get(2)?,
            target_id: row.get(3)?,
            relation_type: row.get(4)?,
            strength: row.get(5)?,
            created_at: parse_timestamp(&created_at),
        })
    }

    // ------------------------------------------------------------------
    // Embedding records
    // ------------------------------------------------------------------

    pub fn upsert_embedding_record(&self, memory_id: &str, provider_tag: &str, vector: &[f32]) -> Result<()> {
        let bytes: Vec<u8> = vector.iter().flat_map(|f| f.to_le_bytes()).collect();
        self.writer().execute(
            "INSERT INTO embedding_records (memory_id, provider_tag, dimensions, vector, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(memory_id) DO UPDATE SET provider_tag=excluded.provider_tag,
                dimensions=excluded.dimensions, vector=excluded.vector, updated_at=excluded.updated_at",
            params![memory_id, provider_tag, vector.len() as i64, bytes, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_embedding_record(&self, memory_id: &str) -> Result<Option<(String, Vec<f32>)>> {
        self.reader()
            .query_row(
                "SELECT provider_tag, vector FROM embedding_records WHERE memory_id = ?1",
                params![memory_id],
                |row| {
                    let tag: String = row.get(0)?;
                    let bytes: Vec<u8> = row.get(1)?;
                    Ok((tag, bytes))
                },
            )
            .optional()?
            .map(|(tag, bytes)| {
                let vector = bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Ok((tag, vector))
            })
            .transpose()
    }

    /// All embedding records, for rehydrating the vector index on
    /// startup and for the background reindex worker.
    pub fn all_embedding_records(&self) -> Result<Vec<(String, String, Vec<f32>)>> {
        let reader = self.reader();
        let mut stmt = reader.prepare(
            "SELECT e.memory_id, e.provider_tag, e.vector, m.owner_id, m.context_id
             FROM embedding_records e JOIN memories m ON m.id = e.memory_id",
        )?;
        let rows: Vec<(String, String, Vec<u8>)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows
            .into_iter()
            .map(|(id, tag, bytes)| {
                let vector = bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                (id, tag, vector)
            })
            .collect())
    }

    pub fn vector_store_path(&self) -> PathBuf {
        self.config.vector_store_path.clone()
    }

    // ------------------------------------------------------------------
    // Audit log
    // ------------------------------------------------------------------

    pub fn record_audit(&self, owner_id: &str, action: &str, target_id: Option<&str>) -> Result<()> {
        self.writer().execute(
            "INSERT INTO audit_log (owner_id, action, target_id, created_at) VALUES (?1,?2,?3,?4)",
            params![owner_id, action, target_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

struct RawMemoryRow {
    id: String,
    owner_id: String,
    context_id: Option<String>,
    title: String,
    content: Vec<u8>,
    content_hash: String,
    codec: String,
    access_level: String,
    is_active: bool,
    importance: i32,
    category: Option<String>,
    tags: String,
    summary: Option<String>,
    metadata: String,
    chunk_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    original_byte_length: i64,
    stored_bytes_total: i64,
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
                .unwrap_or_else(|_| Utc::now())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::AccessLevel;

    fn test_storage() -> (Storage, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = crate::config::Config::default();
        config.data_dir = dir.path().to_path_buf();
        (Storage::new(config).unwrap(), dir)
    }

    #[test]
    fn create_and_get_memory_roundtrips() {
        let (storage, _dir) = test_storage();
        let memory = storage
            .create_memory(CreateMemoryInput {
                owner_id: "u1".into(),
                context_id: None,
                title: "note".into(),
                content: "remember the milk".into(),
                access_level: AccessLevel::Private,
                importance: 5,
                category: None,
                tags: vec!["errand".into()],
                metadata: Default::default(),
            })
            .unwrap();

        let fetched = storage.get_memory(&memory.id).unwrap().unwrap();
        assert_eq!(fetched.content, "remember the milk");
        assert_eq!(fetched.tags, vec!["errand".to_string()]);
    }

    #[test]
    fn update_memory_changes_only_given_fields() {
        let (storage, _dir) = test_storage();
        let memory = storage
            .create_memory(CreateMemoryInput {
                owner_id: "u1".into(),
                context_id: None,
                title: "note".into(),
                content: "original".into(),
                access_level: AccessLevel::Private,
                importance: 5,
                category: None,
                tags: vec![],
                metadata: Default::default(),
            })
            .unwrap();

        let updated = storage
            .update_memory(
                &memory.id,
                UpdateMemoryInput {
                    importance: Some(9),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.importance, 9);
        assert_eq!(updated.content, "original");
    }

    #[test]
    fn delete_memory_is_soft() {
        let (storage, _dir) = test_storage();
        let memory = storage
            .create_memory(CreateMemoryInput {
                owner_id: "u1".into(),
                context_id: None,
                title: "note".into(),
                content: "content".into(),
                access_level: AccessLevel::Private,
                importance: 5,
                category: None,
                tags: vec![],
                metadata: Default::default(),
            })
            .unwrap();

        assert!(storage.delete_memory(&memory.id).unwrap());
        let fetched = storage.get_memory(&memory.id).unwrap().unwrap();
        assert!(!fetched.is_active);
    }

    #[test]
    fn search_memories_matches_keyword() {
        let (storage, _dir) = test_storage();
        storage
            .create_memory(CreateMemoryInput {
                owner_id: "u1".into(),
                context_id: None,
                title: "shopping list".into(),
                content: "buy oat milk and bread".into(),
                access_level: AccessLevel::Private,
                importance: 5,
                category: None,
                tags: vec![],
                metadata: Default::default(),
            })
            .unwrap();

        let results = storage
            .search_memories(&SearchQuery {
                owner_id: "u1".into(),
                query: Some("milk".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(results.len(), 1);
    }

    #[test]
    fn chunking_kicks_in_for_large_content() {
        let (storage, _dir) = test_storage();
        let big_content = "x".repeat(200_000);
        let memory = storage
            .create_memory(CreateMemoryInput {
                owner_id: "u1".into(),
                context_id: None,
                title: "big".into(),
                content: big_content.clone(),
                access_level: AccessLevel::Private,
                importance: 5,
                category: None,
                tags: vec![],
                metadata: Default::default(),
            })
            .unwrap();

        assert!(memory.chunk_count > 0);
        assert_eq!(memory.storage_mode(), "chunked_compressed");
        assert_eq!(memory.original_byte_length, 200_000);
        assert!(memory.stored_bytes_total < 5_000);
        let fetched = storage.get_memory(&memory.id).unwrap().unwrap();
        assert_eq!(fetched.content, big_content);
    }

    #[test]
    fn relations_are_queryable_from_either_side() {
        let (storage, _dir) = test_storage();
        let a = storage
            .create_memory(CreateMemoryInput {
                owner_id: "u1".into(),
                context_id: None,
                title: "a".into(),
                content: "a".into(),
                access_level: AccessLevel::Private,
                importance: 5,
                category: None,
                tags: vec![],
                metadata: Default::default(),
            })
            .unwrap();
        let b = storage
            .create_memory(CreateMemoryInput {
                owner_id: "u1".into(),
                context_id: None,
                title: "b".into(),
                content: "b".into(),
                access_level: AccessLevel::Private,
                importance: 5,
                category: None,
                tags: vec![],
                metadata: Default::default(),
            })
            .unwrap();

        storage
            .create_relation(CreateRelationInput {
                owner_id: "u1".into(),
                source_id: a.id.clone(),
                target_id: b.id.clone(),
                relation_type: "relates_to".into(),
                strength: 0.8,
            })
            .unwrap();

        assert_eq!(storage.get_memory_relations(&a.id).unwrap().len(), 1);
        assert_eq!(storage.get_memory_relations(&b.id).unwrap().len(), 1);
    }
}
