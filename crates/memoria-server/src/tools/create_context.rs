//! `create_context` tool: creates a named grouping of memories.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::{CreateContextInput, MemoryEngine};

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "description": {"type": "string"}
        },
        "required": ["name"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    name: String,
    description: Option<String>,
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let input = CreateContextInput { owner_id: owner_id.to_string(), name: args.name, description: args.description };
    let context = engine.create_context(input).map_err(|e| e.to_string())?;
    serde_json::to_value(context).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_engine;

    #[test]
    fn creates_context() {
        let (engine, _dir) = test_engine();
        let result = execute(&engine, "u1", Some(serde_json::json!({"name": "project-x"}))).unwrap();
        assert_eq!(result["name"], "project-x");
    }
}
