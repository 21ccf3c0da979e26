//! `categorize_memories` tool: rule-based categorization over the
//! caller's full active memory set.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::MemoryEngine;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "autoGenerateTags": {"type": "boolean", "default": true}
        }
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Args {
    auto_generate_tags: Option<bool>,
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => Args::default(),
    };

    let counts = engine
        .categorize_memories(owner_id, args.auto_generate_tags.unwrap_or(true))
        .map_err(|e| e.to_string())?;
    serde_json::to_value(counts).map_err(|e| e.to_string())
}
