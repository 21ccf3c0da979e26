//! `summarize_memory` tool: extractive summary of one memory's content.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::MemoryEngine;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "maxChars": {"type": "integer", "minimum": 20, "maximum": 5000, "default": 280}
        },
        "required": ["id"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    id: String,
    max_chars: Option<usize>,
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let summary = engine
        .summarize_memory(owner_id, &args.id, args.max_chars.unwrap_or(280))
        .map_err(|e| e.to_string())?;
    Ok(serde_json::json!({"id": args.id, "summary": summary}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::create_memory;

    #[tokio::test]
    async fn summarizes_existing_memory() {
        let (engine, _dir) = crate::tools::test_support::test_engine();
        let created = create_memory::execute(
            &engine,
            "u1",
            Some(serde_json::json!({"title": "t", "content": "Rust is fast. It is also safe. Many teams adopt it."})),
        )
        .await
        .unwrap();
        let id = created["id"].as_str().unwrap();

        let result = execute(&engine, "u1", Some(serde_json::json!({"id": id, "maxChars": 30}))).unwrap();
        assert!(result["summary"].as_str().unwrap().len() <= 30);
    }
}
