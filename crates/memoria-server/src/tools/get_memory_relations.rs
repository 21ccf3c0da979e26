//! `get_memory_relations` tool: all relations touching one memory,
//! from either direction.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::MemoryEngine;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {"memoryId": {"type": "string"}},
        "required": ["memoryId"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    memory_id: String,
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let relations = engine.get_memory_relations(owner_id, &args.memory_id).map_err(|e| e.to_string())?;
    Ok(serde_json::json!({"memoryId": args.memory_id, "relations": relations}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{create_memory, create_relation};

    #[tokio::test]
    async fn lists_relations_from_either_side() {
        let (engine, _dir) = crate::tools::test_support::test_engine();
        let a = create_memory::execute(&engine, "u1", Some(serde_json::json!({"title": "a", "content": "c1"})))
            .await
            .unwrap();
        let b = create_memory::execute(&engine, "u1", Some(serde_json::json!({"title": "b", "content": "c2"})))
            .await
            .unwrap();
        create_relation::execute(
            &engine,
            "u1",
            Some(serde_json::json!({"sourceId": a["id"], "targetId": b["id"], "relationType": "follows"})),
        )
        .unwrap();

        let result = execute(&engine, "u1", Some(serde_json::json!({"memoryId": b["id"]}))).unwrap();
        assert_eq!(result["relations"].as_array().unwrap().len(), 1);
    }
}
