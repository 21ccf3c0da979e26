//! `update_memory` tool: patches an existing memory in place.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use memoria_core::{MemoryEngine, UpdateMemoryInput};

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "title": {"type": "string"},
            "content": {"type": "string"},
            "accessLevel": {"type": "string", "enum": ["private", "shared", "public"]},
            "importance": {"type": "integer", "minimum": 1, "maximum": 10},
            "category": {"type": "string"},
            "tags": {"type": "array", "items": {"type": "string"}},
            "summary": {"type": "string"},
            "metadata": {"type": "object"},
            "isActive": {"type": "boolean"}
        },
        "required": ["id"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    id: String,
    title: Option<String>,
    content: Option<String>,
    access_level: Option<String>,
    importance: Option<i32>,
    category: Option<String>,
    tags: Option<Vec<String>>,
    summary: Option<String>,
    metadata: Option<HashMap<String, Value>>,
    is_active: Option<bool>,
}

pub async fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let access_level = match args.access_level.as_deref() {
        Some(name) => Some(
            memoria_core::memory::AccessLevel::parse_name(name)
                .ok_or_else(|| format!("invalid accessLevel '{name}'"))?,
        ),
        None => None,
    };

    let patch = UpdateMemoryInput {
        title: args.title,
        content: args.content,
        access_level,
        importance: args.importance,
        category: args.category,
        tags: args.tags,
        summary: args.summary,
        metadata: args.metadata,
        is_active: args.is_active,
    };

    let memory = engine.update_memory(owner_id, &args.id, patch).await.map_err(|e| e.to_string())?;
    let storage_mode = memory.storage_mode();
    let mut value = serde_json::to_value(memory).map_err(|e| e.to_string())?;
    value["storageMode"] = Value::String(storage_mode.to_string());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::create_memory;

    #[tokio::test]
    async fn updates_title() {
        let (engine, _dir) = crate::tools::test_support::test_engine();
        let created = create_memory::execute(&engine, "u1", Some(serde_json::json!({"title": "old", "content": "c"})))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let updated = execute(&engine, "u1", Some(serde_json::json!({"id": id, "title": "new"}))).await.unwrap();
        assert_eq!(updated["title"], "new");
    }
}
