mod support;

use memoria_core::engine::CreateMemoryOptions;
use memoria_core::CreateMemoryInput;

#[tokio::test]
async fn large_compressible_content_is_chunked_and_shrinks() {
    let (engine, _dir) = support::test_engine();
    let content = "A".repeat(200_000);

    let created = engine
        .create_memory(
            CreateMemoryInput {
                owner_id: "owner-1".into(),
                context_id: None,
                title: "big".into(),
                content: content.clone(),
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

    assert_eq!(created.storage_mode(), "chunked_compressed");
    assert_eq!(created.original_byte_length, 200_000);
    assert!(created.stored_bytes_total < 5_000);

    let fetched = engine.get_memory("owner-1", &created.id).await.unwrap();
    assert_eq!(fetched.content, content);
}
