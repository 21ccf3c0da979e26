mod support;

use memoria_core::engine::CreateMemoryOptions;
use memoria_core::{CreateMemoryInput, CreateRelationInput};

#[tokio::test]
async fn deleting_the_source_memory_drops_its_relations() {
    let (engine, _dir) = support::test_engine();

    let m1 = engine
        .create_memory(
            CreateMemoryInput {
                owner_id: "owner-1".into(),
                context_id: None,
                title: "m1".into(),
                content: "first memory".into(),
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

    let m2 = engine
        .create_memory(
            CreateMemoryInput {
                owner_id: "owner-1".into(),
                context_id: None,
                title: "m2".into(),
                content: "second memory".into(),
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
        .create_relation(CreateRelationInput {
            owner_id: "owner-1".into(),
            source_id: m1.id.clone(),
            target_id: m2.id.clone(),
            relation_type: "builds_upon".into(),
            strength: 0.9,
        })
        .unwrap();

    assert_eq!(engine.get_memory_relations("owner-1", &m2.id).unwrap().len(), 1);

    engine.delete_memory("owner-1", &m1.id).await.unwrap();

    assert!(engine.get_memory_relations("owner-1", &m2.id).unwrap().is_empty());
}
