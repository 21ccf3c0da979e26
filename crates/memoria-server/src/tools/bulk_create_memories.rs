//! `bulk_create_memories` tool: creates many memories in one call,
//! batched internally (§5 Bulk operations) so a failure partway through
//! still reports how far it got.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use memoria_core::engine::CreateMemoryOptions;
use memoria_core::{CreateMemoryInput, MemoryEngine};

const BATCH_SIZE: usize = 100;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "maxItems": 1000,
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "content": {"type": "string"},
                        "contextId": {"type": "string"},
                        "category": {"type": "string"},
                        "tags": {"type": "array", "items": {"type": "string"}},
                        "metadata": {"type": "object"}
                    },
                    "required": ["title", "content"]
                }
            }
        },
        "required": ["items"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    title: String,
    content: String,
    context_id: Option<String>,
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Args {
    items: Vec<Item>,
}

pub async fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let mut created = Vec::new();
    for batch in args.items.chunks(BATCH_SIZE) {
        for item in batch {
            let input = CreateMemoryInput {
                owner_id: owner_id.to_string(),
                context_id: item.context_id.clone(),
                title: item.title.clone(),
                content: item.content.clone(),
                access_level: Default::default(),
                importance: 5,
                category: item.category.clone(),
                tags: item.tags.clone(),
                metadata: item.metadata.clone(),
            };
            match engine.create_memory(input, CreateMemoryOptions::default()).await {
                Ok(memory) => created.push(memory.id),
                Err(e) => {
                    return Ok(serde_json::json!({
                        "created": created,
                        "failedAt": created.len(),
                        "error": e.to_string(),
                    }));
                }
            }
        }
    }

    Ok(serde_json::json!({"created": created, "count": created.len()}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_engine;

    #[tokio::test]
    async fn creates_all_items() {
        let (engine, _dir) = test_engine();
        let args = serde_json::json!({
            "items": [
                {"title": "a", "content": "one"},
                {"title": "b", "content": "two"},
            ]
        });
        let result = execute(&engine, "u1", Some(args)).await.unwrap();
        assert_eq!(result["count"], 2);
    }
}
