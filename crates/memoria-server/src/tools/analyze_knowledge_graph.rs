//! `analyze_knowledge_graph` tool: overview/centrality/connections
//! views over the caller's relation graph.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::MemoryEngine;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "mode": {"type": "string", "enum": ["overview", "centrality", "connections"]},
            "focusMemoryId": {"type": "string", "description": "Required when mode is 'centrality'"}
        },
        "required": ["mode"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    mode: String,
    focus_memory_id: Option<String>,
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    match args.mode.as_str() {
        "overview" => {
            let overview = engine.analyze_knowledge_graph_overview(owner_id).map_err(|e| e.to_string())?;
            serde_json::to_value(overview).map_err(|e| e.to_string())
        }
        "centrality" => {
            let focus = args.focus_memory_id.ok_or_else(|| "focusMemoryId is required for mode 'centrality'".to_string())?;
            let centrality = engine.analyze_knowledge_graph_centrality(owner_id, &focus).map_err(|e| e.to_string())?;
            serde_json::to_value(centrality).map_err(|e| e.to_string())
        }
        "connections" => {
            let connections = engine.analyze_knowledge_graph_connections(owner_id).map_err(|e| e.to_string())?;
            Ok(serde_json::json!({"connections": connections}))
        }
        other => Err(format!("unknown mode '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_engine;

    #[test]
    fn overview_on_empty_owner_is_zeroed() {
        let (engine, _dir) = test_engine();
        let result = execute(&engine, "u1", Some(serde_json::json!({"mode": "overview"}))).unwrap();
        assert_eq!(result["totalMemories"], 0);
    }

    #[test]
    fn centrality_without_focus_id_fails() {
        let (engine, _dir) = test_engine();
        let err = execute(&engine, "u1", Some(serde_json::json!({"mode": "centrality"}))).unwrap_err();
        assert!(err.contains("focusMemoryId"));
    }
}
