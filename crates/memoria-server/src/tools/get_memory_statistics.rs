//! `get_memory_statistics` tool: aggregate counts for the caller.

use serde_json::Value;

use memoria_core::MemoryEngine;

pub fn schema() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, _args: Option<Value>) -> Result<Value, String> {
    let stats = engine.get_memory_statistics(owner_id).map_err(|e| e.to_string())?;
    serde_json::to_value(stats).map_err(|e| e.to_string())
}
