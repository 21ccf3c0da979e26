//! `create_relation` tool: links two of the caller's memories with a
//! typed, weighted edge.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::{CreateRelationInput, MemoryEngine};

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "sourceId": {"type": "string"},
            "targetId": {"type": "string"},
            "relationType": {"type": "string"},
            "strength": {"type": "number", "minimum": 0.0, "maximum": 1.0, "default": 1.0}
        },
        "required": ["sourceId", "targetId", "relationType"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    source_id: String,
    target_id: String,
    relation_type: String,
    strength: Option<f64>,
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let input = CreateRelationInput {
        owner_id: owner_id.to_string(),
        source_id: args.source_id,
        target_id: args.target_id,
        relation_type: args.relation_type,
        strength: args.strength.unwrap_or(1.0),
    };

    let relation = engine.create_relation(input).map_err(|e| e.to_string())?;
    serde_json::to_value(relation).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::create_memory;

    #[tokio::test]
    async fn links_two_memories() {
        let (engine, _dir) = crate::tools::test_support::test_engine();
        let a = create_memory::execute(&engine, "u1", Some(serde_json::json!({"title": "a", "content": "c1"})))
            .await
            .unwrap();
        let b = create_memory::execute(&engine, "u1", Some(serde_json::json!({"title": "b", "content": "c2"})))
            .await
            .unwrap();

        let args = serde_json::json!({
            "sourceId": a["id"], "targetId": b["id"], "relationType": "builds_upon"
        });
        let result = execute(&engine, "u1", Some(args)).unwrap();
        assert_eq!(result["relationType"], "builds_upon");
    }
}
