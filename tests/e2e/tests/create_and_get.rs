mod support;

use memoria_core::engine::CreateMemoryOptions;
use memoria_core::CreateMemoryInput;

#[tokio::test]
async fn create_then_get_round_trips_content() {
    let (engine, _dir) = support::test_engine();

    let created = engine
        .create_memory(
            CreateMemoryInput {
                owner_id: "owner-1".into(),
                context_id: None,
                title: "T".into(),
                content: "hello world".into(),
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

    let fetched = engine.get_memory("owner-1", &created.id).await.unwrap();
    assert_eq!(fetched.content, "hello world");
    assert!(fetched.category.is_none() || fetched.category.as_deref() == Some("other"));
    assert_eq!(fetched.importance, 5);
}
