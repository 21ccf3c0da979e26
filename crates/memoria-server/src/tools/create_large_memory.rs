//! `create_large_memory` tool: the same contract as `create_memory`, but
//! documents and allows content past the inline chunking threshold —
//! the storage layer chunks transparently, so this is a thin wrapper
//! that just relaxes the advertised size expectation for callers who
//! know up front they're sending a big payload.

use serde_json::Value;

use memoria_core::MemoryEngine;

use super::create_memory;

pub fn schema() -> Value {
    let mut schema = create_memory::schema();
    schema["properties"]["content"]["description"] =
        Value::String("Memory body; transparently chunked past 64KiB".to_string());
    schema
}

pub async fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    create_memory::execute(engine, owner_id, args).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_engine;

    #[tokio::test]
    async fn stores_content_past_chunk_threshold() {
        let (engine, _dir) = test_engine();
        let big = "x".repeat(200 * 1024);
        let args = serde_json::json!({"title": "big", "content": big});
        let result = execute(&engine, "u1", Some(args)).await.unwrap();
        assert_eq!(result["title"], "big");
    }
}
