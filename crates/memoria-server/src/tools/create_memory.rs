//! `create_memory` tool: stores one new memory for the caller.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use memoria_core::{CreateMemoryInput, MemoryEngine};
use memoria_core::engine::CreateMemoryOptions;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "title": {"type": "string", "description": "Short title, 1-500 characters"},
            "content": {"type": "string", "description": "Memory body"},
            "contextId": {"type": "string", "description": "Optional context to file this memory under"},
            "accessLevel": {"type": "string", "enum": ["private", "shared", "public"], "default": "private"},
            "importance": {"type": "integer", "minimum": 1, "maximum": 10, "default": 5},
            "category": {"type": "string"},
            "tags": {"type": "array", "items": {"type": "string"}},
            "metadata": {"type": "object"},
            "autoRelate": {"type": "boolean", "default": false, "description": "Auto-create similar_to relations to close semantic neighbors"},
            "similarityThreshold": {"type": "number", "minimum": 0.0, "maximum": 1.0}
        },
        "required": ["title", "content"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    title: String,
    content: String,
    context_id: Option<String>,
    #[serde(default)]
    access_level: Option<String>,
    #[serde(default)]
    importance: Option<i32>,
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    metadata: HashMap<String, Value>,
    #[serde(default)]
    auto_relate: bool,
    similarity_threshold: Option<f32>,
}

pub async fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let access_level = match args.access_level.as_deref() {
        Some(name) => memoria_core::memory::AccessLevel::parse_name(name)
            .ok_or_else(|| format!("invalid accessLevel '{name}'"))?,
        None => Default::default(),
    };

    let input = CreateMemoryInput {
        owner_id: owner_id.to_string(),
        context_id: args.context_id,
        title: args.title,
        content: args.content,
        access_level,
        importance: args.importance.unwrap_or(5),
        category: args.category,
        tags: args.tags,
        metadata: args.metadata,
    };

    let options = CreateMemoryOptions {
        auto_relate: args.auto_relate,
        similarity_threshold: args.similarity_threshold,
    };

    let memory = engine.create_memory(input, options).await.map_err(|e| e.to_string())?;
    let storage_mode = memory.storage_mode();
    let mut value = serde_json::to_value(memory).map_err(|e| e.to_string())?;
    value["storageMode"] = Value::String(storage_mode.to_string());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_engine;

    #[tokio::test]
    async fn creates_and_returns_memory() {
        let (engine, _dir) = test_engine();
        let args = serde_json::json!({"title": "t", "content": "rust is great"});
        let result = execute(&engine, "u1", Some(args)).await.unwrap();
        assert_eq!(result["title"], "t");
        assert_eq!(result["ownerId"], "u1");
    }

    #[tokio::test]
    async fn rejects_unknown_access_level() {
        let (engine, _dir) = test_engine();
        let args = serde_json::json!({"title": "t", "content": "c", "accessLevel": "bogus"});
        let err = execute(&engine, "u1", Some(args)).await.unwrap_err();
        assert!(err.contains("accessLevel"));
    }

    #[test]
    fn schema_requires_title_and_content() {
        let s = schema();
        let required = s["required"].as_array().unwrap();
        assert!(required.contains(&serde_json::json!("title")));
        assert!(required.contains(&serde_json::json!("content")));
    }
}
