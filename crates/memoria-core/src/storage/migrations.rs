//! Database migrations.

pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: users, contexts, memories, chunks, relations",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "FTS5 keyword index over memories",
        up: MIGRATION_V2_UP,
    },
    Migration {
        version: 3,
        description: "Audit log for mutating operations",
        up: MIGRATION_V3_UP,
    },
    Migration {
        version: 4,
        description: "Payload size bookkeeping for storage_mode reporting",
        up: MIGRATION_V4_UP,
    },
];

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS contexts (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(owner_id, name)
);
CREATE INDEX IF NOT EXISTS idx_contexts_owner ON contexts(owner_id);

CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    context_id TEXT REFERENCES contexts(id) ON DELETE SET NULL,
    title TEXT NOT NULL,
    content BLOB NOT NULL,
    content_hash TEXT NOT NULL,
    codec TEXT NOT NULL DEFAULT 'none',
    access_level TEXT NOT NULL DEFAULT 'private',
    is_active INTEGER NOT NULL DEFAULT 1,
    importance INTEGER NOT NULL DEFAULT 5,
    category TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    summary TEXT,
    metadata TEXT NOT NULL DEFAULT '{}',
    chunk_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_memories_owner ON memories(owner_id);
CREATE INDEX IF NOT EXISTS idx_memories_context ON memories(context_id);
CREATE INDEX IF NOT EXISTS idx_memories_category ON memories(owner_id, category);
CREATE INDEX IF NOT EXISTS idx_memories_active ON memories(owner_id, is_active);

CREATE TABLE IF NOT EXISTS memory_chunks (
    memory_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    sequence INTEGER NOT NULL,
    data BLOB NOT NULL,
    byte_len INTEGER NOT NULL,
    PRIMARY KEY (memory_id, sequence)
);

CREATE TABLE IF NOT EXISTS relations (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    source_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    target_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    relation_type TEXT NOT NULL,
    strength REAL NOT NULL DEFAULT 1.0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(source_id, target_id, relation_type)
);
CREATE INDEX IF NOT EXISTS idx_relations_owner ON relations(owner_id);
CREATE INDEX IF NOT EXISTS idx_relations_source ON relations(source_id);
CREATE INDEX IF NOT EXISTS idx_relations_target ON relations(target_id);

CREATE TABLE IF NOT EXISTS embedding_records (
    memory_id TEXT PRIMARY KEY REFERENCES memories(id) ON DELETE CASCADE,
    provider_tag TEXT NOT NULL,
    dimensions INTEGER NOT NULL,
    vector BLOB NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_embedding_records_provider ON embedding_records(provider_tag);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

INSERT INTO schema_version (version) VALUES (1);
"#;

const MIGRATION_V2_UP: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
    memory_id UNINDEXED,
    title,
    content,
    tokenize = 'porter unicode61'
);

CREATE TRIGGER IF NOT EXISTS memories_fts_insert AFTER INSERT ON memories BEGIN
    INSERT INTO memories_fts(memory_id, title, content) VALUES (new.id, new.title, new.content);
END;

CREATE TRIGGER IF NOT EXISTS memories_fts_update AFTER UPDATE ON memories BEGIN
    DELETE FROM memories_fts WHERE memory_id = old.id;
    INSERT INTO memories_fts(memory_id, title, content) VALUES (new.id, new.title, new.content);
END;

CREATE TRIGGER IF NOT EXISTS memories_fts_delete AFTER DELETE ON memories BEGIN
    DELETE FROM memories_fts WHERE memory_id = old.id;
END;

UPDATE schema_version SET version = 2, applied_at = datetime('now');
INSERT INTO schema_version (version) SELECT 2 WHERE NOT EXISTS (SELECT 1 FROM schema_version WHERE version = 2);
"#;

const MIGRATION_V3_UP: &str = r#"
CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id TEXT NOT NULL,
    action TEXT NOT NULL,
    target_id TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_audit_log_owner ON audit_log(owner_id, created_at);

INSERT INTO schema_version (version) VALUES (3);
"#;

const MIGRATION_V4_UP: &str = r#"
ALTER TABLE memories ADD COLUMN original_byte_length INTEGER NOT NULL DEFAULT 0;
ALTER TABLE memories ADD COLUMN stored_bytes_total INTEGER NOT NULL DEFAULT 0;

INSERT INTO schema_version (version) VALUES (4);
"#;

pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| row.get(0))
        .or(Ok(0))
}

pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn).unwrap_or(0);
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(version = migration.version, description = migration.description, "applying migration");
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
