//! `delete_memory` tool: soft-deletes a memory owned by the caller.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::MemoryEngine;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {"id": {"type": "string"}},
        "required": ["id"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    id: String,
}

pub async fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    engine.delete_memory(owner_id, &args.id).await.map_err(|e| e.to_string())?;
    Ok(serde_json::json!({"deleted": true, "id": args.id}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::create_memory;

    #[tokio::test]
    async fn deletes_existing_memory() {
        let (engine, _dir) = crate::tools::test_support::test_engine();
        let created = create_memory::execute(&engine, "u1", Some(serde_json::json!({"title": "t", "content": "c"})))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let result = execute(&engine, "u1", Some(serde_json::json!({"id": id}))).await.unwrap();
        assert_eq!(result["deleted"], true);
        assert!(engine.get_memory("u1", &id).await.is_err());
    }
}
