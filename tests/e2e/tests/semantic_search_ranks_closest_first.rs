mod support;

use memoria_core::engine::CreateMemoryOptions;
use memoria_core::{CreateMemoryInput, SemanticSearchQuery};

// The bundled local embedding provider is a deterministic hashed
// bag-of-words, not a trained model — it picks up shared vocabulary,
// not synonymy. The query below shares tokens with the cat memory and
// none with the consensus-protocol one, which is what the hashing
// scheme actually needs to rank them apart.
#[tokio::test]
async fn semantic_search_ranks_the_topically_closer_memory_first() {
    let (engine, _dir) = support::test_engine();

    let cats = engine
        .create_memory(
            CreateMemoryInput {
                owner_id: "owner-1".into(),
                context_id: None,
                title: "cats".into(),
                content: "cats are mammals that purr".into(),
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

    engine
        .create_memory(
            CreateMemoryInput {
                owner_id: "owner-1".into(),
                context_id: None,
                title: "raft".into(),
                content: "distributed consensus via Raft".into(),
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

    let results = engine
        .search_semantic(SemanticSearchQuery {
            owner_id: "owner-1".into(),
            query: "cats and their feline behavior".into(),
            top_k: 5,
            context_id: None,
            min_similarity: None,
        })
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].memory.id, cats.id);
    assert!(results[0].similarity > 0.4);
}
