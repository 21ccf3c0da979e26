//! `ingest_knowledge` tool: splits a document into chapters and stores
//! one memory per chapter, chained by `follows` relations.

use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;

use memoria_core::MemoryEngine;

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "content": {"type": "string", "description": "UTF-8 text; mutually exclusive with contentBase64"},
            "contentBase64": {"type": "string", "description": "Base64-encoded bytes, decoded with a UTF-8/Latin-1/CP-1252 fallback chain"},
            "title": {"type": "string"},
            "contextId": {"type": "string"}
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    content: Option<String>,
    content_base64: Option<String>,
    title: Option<String>,
    context_id: Option<String>,
}

pub async fn execute(engine: &MemoryEngine, owner_id: &str, args: Option<Value>) -> Result<Value, String> {
    let args: Args = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("invalid arguments: {e}"))?,
        None => return Err("missing arguments".to_string()),
    };

    let bytes = match (args.content, args.content_base64) {
        (Some(text), None) => text.into_bytes(),
        (None, Some(encoded)) => base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| format!("invalid base64: {e}"))?,
        (Some(_), Some(_)) => return Err("provide either content or contentBase64, not both".to_string()),
        (None, None) => return Err("provide content or contentBase64".to_string()),
    };

    let result = engine
        .ingest_knowledge(owner_id, &bytes, args.title, args.context_id)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(result).map_err(|e| e.to_string())
}
