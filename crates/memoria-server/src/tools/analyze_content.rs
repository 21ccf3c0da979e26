//! `analyze_content` tool: deterministic text analysis (keywords,
//! sentiment, complexity, readability) over the caller's memories.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::MemoryEngine;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "mode": {"type": "string", "enum": ["keywords", "sentiment", "complexity", "readability"]},
            "ids": {"type": "array", "items": {"type": "string"}, "description": "Restrict to these memory ids; omit to analyze all active memories"},
            "topN": {"type": "integer", "minimum": 1, "maximum": 100, "default": 10}
        },
        "required": ["mode"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    mode: String,
    ids: Option<Vec<String>>,
    top_n: Option<usize>,
}

pub fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };
    let ids = args.ids.as_deref();

    let result = match args.mode.as_str() {
        "keywords" => {
            let keywords = engine
                .analyze_content_keywords(owner_id, ids, args.top_n.unwrap_or(10))
                .map_err(|e| e.to_string())?;
            serde_json::json!({"mode": "keywords", "keywords": keywords})
        }
        "sentiment" => {
            let sentiment = engine.analyze_content_sentiment(owner_id, ids).map_err(|e| e.to_string())?;
            serde_json::json!({"mode": "sentiment", "sentiment": sentiment})
        }
        "complexity" => {
            let complexity = engine.analyze_content_complexity(owner_id, ids).map_err(|e| e.to_string())?;
            serde_json::json!({"mode": "complexity", "complexity": complexity})
        }
        "readability" => {
            let readability = engine.analyze_content_readability(owner_id, ids).map_err(|e| e.to_string())?;
            serde_json::json!({"mode": "readability", "readability": readability})
        }
        other => return Err(format!("unknown mode '{other}'")),
    };

    Ok(result)
}
