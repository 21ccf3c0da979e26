//! `index_knowledge_batch` tool: runs `ingest_knowledge` over several
//! documents in one call and aggregates the results.

use serde::Deserialize;
use serde_json::Value;

use memoria_core::MemoryEngine;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "documents": {
                "type": "array",
                "maxItems": 50,
                "items": {
                    "type": "object",
                    "properties": {
                        "content": {"type": "string"},
                        "title": {"type": "string"},
                        "contextId": {"type": "string"}
                    },
                    "required": ["content"]
                }
            }
        },
        "required": ["documents"]
    })
}

#[derive(Debug, Deserialize)]
struct Document {
    content: String,
    title: Option<String>,
    #[serde(rename = "contextId")]
    context_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Args {
    documents: Vec<Document>,
}

pub async fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let mut memories_created = 0;
    let mut relations_created = 0;
    let mut skipped = 0;
    let mut errors = Vec::new();

    for document in args.documents {
        match engine
            .ingest_knowledge(owner_id, document.content.as_bytes(), document.title, document.context_id)
            .await
        {
            Ok(result) => {
                memories_created += result.memories_created;
                relations_created += result.relations_created;
                skipped += result.skipped;
                errors.extend(result.errors);
            }
            Err(e) => errors.push(e.to_string()),
        }
    }

    Ok(serde_json::json!({
        "memoriesCreated": memories_created,
        "relationsCreated": relations_created,
        "skipped": skipped,
        "errors": errors,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_engine;

    #[tokio::test]
    async fn aggregates_across_documents() {
        let (engine, _dir) = test_engine();
        let args = serde_json::json!({
            "documents": [
                {"content": "first doc body"},
                {"content": "# A\nsecond doc part one\n# B\nsecond doc part two"},
            ]
        });
        let result = execute(&engine, "u1", Some(args)).await.unwrap();
        assert_eq!(result["memoriesCreated"], 3);
    }
}
