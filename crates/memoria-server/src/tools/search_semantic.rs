//! `search_semantic` tool: embeds the query and ranks the caller's
//! memories by cosine similarity.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::{MemoryEngine, SemanticSearchQuery};

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {"type": "string"},
            "topK": {"type": "integer", "minimum": 1, "maximum": 200, "default": 10},
            "contextId": {"type": "string"},
            "minSimilarity": {"type": "number", "minimum": 0.0, "maximum": 1.0}
        },
        "required": ["query"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    query: String,
    top_k: Option<usize>,
    context_id: Option<String>,
    min_similarity: Option<f32>,
}

pub async fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    if args.query.trim().is_empty() {
        return Err("query must not be empty".to_string());
    }

    let query = SemanticSearchQuery {
        owner_id: owner_id.to_string(),
        query: args.query,
        top_k: args.top_k.unwrap_or(10).clamp(1, 200),
        context_id: args.context_id,
        min_similarity: args.min_similarity,
    };

    let results = engine.search_semantic(query).await.map_err(|e| e.to_string())?;
    Ok(serde_json::json!({"total": results.len(), "results": results}))
}
