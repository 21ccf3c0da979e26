mod support;

use memoria_core::SearchQuery;

const BOOK: &str = "\
# Chapter One

The first chapter introduces the protagonist and the setting.

# Chapter Two

The second chapter raises the central conflict.

# Chapter Three

The third chapter resolves it.
";

#[tokio::test]
async fn ingesting_a_book_creates_one_memory_per_chapter_chained_by_follows() {
    let (engine, _dir) = support::test_engine();

    let result = engine
        .ingest_knowledge("owner-1", BOOK.as_bytes(), Some("My Book".into()), None)
        .await
        .unwrap();

    assert_eq!(result.memories_created, 3);
    assert_eq!(result.relations_created, 2);
    assert!(result.errors.is_empty());

    let memories = engine
        .search_memories(&SearchQuery {
            owner_id: "owner-1".into(),
            query: None,
            context_id: None,
            category: None,
            tags: None,
            limit: Some(10),
            offset: None,
        })
        .unwrap();
    assert_eq!(memories.len(), 3);

    let mut follows_edges = 0;
    for memory in &memories {
        let relations = engine.get_memory_relations("owner-1", &memory.id).unwrap();
        follows_edges += relations.iter().filter(|r| r.relation_type == "follows").count();
    }
    // Each of the two `follows` edges touches two memories, so each is
    // counted twice across the loop.
    assert_eq!(follows_edges, 4);
}
