mod support;

use memoria_core::engine::CreateMemoryOptions;
use memoria_core::{CreateMemoryInput, EngineError};

#[tokio::test]
async fn a_flipped_byte_in_a_stored_chunk_surfaces_as_corrupted() {
    let (engine, dir) = support::test_engine();

    let memory = engine
        .create_memory(
            CreateMemoryInput {
                owner_id: "owner-1".into(),
                context_id: None,
                title: "big".into(),
                content: "B".repeat(200_000),
                access_level: Default::default(),
                importance: 5,
                category: None,
                tags: vec![],
                metadata: Default::default(),
            },
            CreateMemoryOptions::default(),
        )
        .await
        .unwrap();

    support::corrupt_stored_payload(dir.path(), &memory.id);

    let err = engine.get_memory("owner-1", &memory.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Corrupted(_)));

    // The row itself is still there; only materializing its content fails.
    let row_exists: i64 = {
        let db_path = dir.path().join("memoria.db");
        let conn = rusqlite::Connection::open(db_path).unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM memories WHERE id = ?1",
            [&memory.id],
            |row| row.get(0),
        )
        .unwrap()
    };
    assert_eq!(row_exists, 1);
}
