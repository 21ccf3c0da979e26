//! `find_similar_knowledge` tool: semantic search restricted to
//! memories created through ingestion (tagged `ingested`).

use serde::Deserialize;
use serde_json::Value;

use memoria_core::{MemoryEngine, SemanticSearchQuery};

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {"type": "string"},
            "topK": {"type": "integer", "minimum": 1, "maximum": 200, "default": 10},
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

    let top_k = args.top_k.unwrap_or(10).clamp(1, 200);
    // Over-fetch before filtering down to ingested-only hits so the
    // caller still gets up to top_k matches when some are filtered out.
    let query = SemanticSearchQuery {
        owner_id: owner_id.to_string(),
        query: args.query,
        top_k: top_k * 4,
        context_id: None,
        min_similarity: args.min_similarity,
    };

    let mut hits = engine.search_semantic(query).await.map_err(|e| e.to_string())?;
    hits.retain(|hit| hit.memory.tags.iter().any(|tag| tag == "ingested"));
    hits.truncate(top_k);

    Ok(serde_json::json!({"total": hits.len(), "results": hits}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ingest_knowledge, test_support::test_engine};

    #[tokio::test]
    async fn only_returns_ingested_memories() {
        let (engine, _dir) = test_engine();
        ingest_knowledge::execute(&engine, "u1", Some(serde_json::json!({"content": "rust ownership rules explained"})))
            .await
            .unwrap();

        let result = execute(&engine, "u1", Some(serde_json::json!({"query": "rust ownership"}))).await.unwrap();
        assert_eq!(result["total"], 1);
    }
}
