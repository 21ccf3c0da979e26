//! `search_memories` tool: keyword/filter search over the caller's memories.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::{MemoryEngine, SearchQuery};

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {"type": "string", "description": "Keyword query matched against title/content"},
            "contextId": {"type": "string"},
            "category": {"type": "string"},
            "tags": {"type": "array", "items": {"type": "string"}},
            "limit": {"type": "integer", "minimum": 1, "maximum": 200, "default": 20},
            "offset": {"type": "integer", "minimum": 0, "default": 0}
        }
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Args {
    query: Option<String>,
    context_id: Option<String>,
    category: Option<String>,
    tags: Option<Vec<String>>,
    limit: Option<i64>,
    offset: Option<i64>,
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => Args::default(),
    };

    let query = SearchQuery {
        owner_id: owner_id.to_string(),
        query: args.query,
        context_id: args.context_id,
        category: args.category,
        tags: args.tags,
        limit: Some(args.limit.unwrap_or(20).clamp(1, 200)),
        offset: Some(args.offset.unwrap_or(0).max(0)),
    };

    let results = engine.search_memories(&query).map_err(|e| e.to_string())?;
    Ok(serde_json::json!({"total": results.len(), "results": results}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_engine;
    use memoria_core::engine::CreateMemoryOptions;
    use memoria_core::CreateMemoryInput;

    #[tokio::test]
    async fn finds_by_keyword() {
        let (engine, _dir) = test_engine();
        engine
            .create_memory(
                CreateMemoryInput {
                    owner_id: "u1".to_string(),
                    context_id: None,
                    title: "a".to_string(),
                    content: "rust ownership".to_string(),
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

        let result = execute(&engine, "u1", Some(serde_json::json!({"query": "rust"}))).unwrap();
        assert_eq!(result["total"], 1);
    }
}
