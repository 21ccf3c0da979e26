//! `bulk_create_relations` tool: idempotent batch relation creation
//! (duplicate (source, target, type) triples update strength in place).

use serde::Deserialize;
use serde_json::Value;

use memoria_core::{CreateRelationInput, MemoryEngine};

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "relations": {
                "type": "array",
                "maxItems": 1000,
                "items": {
                    "type": "object",
                    "properties": {
                        "sourceId": {"type": "string"},
                        "targetId": {"type": "string"},
                        "relationType": {"type": "string"},
                        "strength": {"type": "number", "minimum": 0.0, "maximum": 1.0}
                    },
                    "required": ["sourceId", "targetId", "relationType"]
                }
            }
        },
        "required": ["relations"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    source_id: String,
    target_id: String,
    relation_type: String,
    strength: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Args {
    relations: Vec<Item>,
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let inputs: Vec<CreateRelationInput> = args
        .relations
        .into_iter()
        .map(|item| CreateRelationInput {
            owner_id: owner_id.to_string(),
            source_id: item.source_id,
            target_id: item.target_id,
            relation_type: item.relation_type,
            strength: item.strength.unwrap_or(1.0),
        })
        .collect();

    let created = engine.bulk_create_relations(inputs).map_err(|e| e.to_string())?;
    Ok(serde_json::json!({"count": created.len(), "relations": created}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::create_memory;

    #[tokio::test]
    async fn creates_all_relations() {
        let (engine, _dir) = crate::tools::test_support::test_engine();
        let a = create_memory::execute(&engine, "u1", Some(serde_json::json!({"title": "a", "content": "c1"})))
            .await
            .unwrap();
        let b = create_memory::execute(&engine, "u1", Some(serde_json::json!({"title": "b", "content": "c2"})))
            .await
            .unwrap();

        let args = serde_json::json!({
            "relations": [{"sourceId": a["id"], "targetId": b["id"], "relationType": "follows"}]
        });
        let result = execute(&engine, "u1", Some(args)).unwrap();
        assert_eq!(result["count"], 1);
    }
}
