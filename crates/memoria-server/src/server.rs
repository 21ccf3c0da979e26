//! MCP server: dispatches JSON-RPC requests to the tool catalog and the
//! `memory://summary` resource, over whatever transport drives it
//! (currently stdio; see `protocol::stdio`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use memoria_core::MemoryEngine;

use crate::protocol::messages::{
    CallToolRequest, CallToolResult, InitializeRequest, InitializeResult, ListResourcesResult,
    ListToolsResult, ReadResourceRequest, ReadResourceResult, ResourceContent, ResourceDescription,
    ServerCapabilities, ServerInfo, ToolDescription,
};
use crate::protocol::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_VERSION};
use crate::tools;

pub struct McpServer {
    engine: Arc<MemoryEngine>,
    owner_id: String,
    initialized: bool,
    tool_call_count: AtomicU64,
}

impl McpServer {
    pub fn new(engine: Arc<MemoryEngine>, owner_id: String) -> Self {
        Self { engine, owner_id, initialized: false, tool_call_count: AtomicU64::new(0) }
    }

    /// Dispatches one request, returning `None` for notifications (no
    /// `id`), which must produce no response on the wire.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "notifications/initialized" => return None,
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,
            "resources/list" => self.handle_resources_list(),
            "resources/read" => self.handle_resources_read(request.params),
            "ping" => Ok(serde_json::json!({})),
            other => Err(JsonRpcError::method_not_found_with_message(&format!("unknown method: {other}"))),
        };

        let id = id?;
        Some(match result {
            Ok(value) => JsonRpcResponse::success(Some(id), value),
            Err(error) => JsonRpcResponse::error(Some(id), error),
        })
    }

    async fn handle_initialize(&mut self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let request: InitializeRequest = match params {
            Some(v) => serde_json::from_value(v).map_err(|e| JsonRpcError::invalid_params(&e.to_string()))?,
            None => return Err(JsonRpcError::invalid_params("missing initialize params")),
        };

        tracing::info!(client_protocol_version = %request.protocol_version, "mcp session initializing");
        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: serde_json::json!({}),
                resources: serde_json::json!({}),
            },
            server_info: ServerInfo { name: "memoria-mcp".to_string(), version: env!("CARGO_PKG_VERSION").to_string() },
            instructions: "A persistent memory store. Use create_memory to save things worth \
                remembering, search_semantic or search_memories to recall them, and \
                ingest_knowledge to split a longer document into linked memories."
                .to_string(),
        };

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<serde_json::Value, JsonRpcError> {
        if !self.initialized {
            return Err(JsonRpcError::server_not_initialized());
        }

        let descriptions: Vec<(&str, &str, serde_json::Value)> = vec![
            ("create_memory", "Store one new memory for the caller.", tools::create_memory::schema()),
            ("search_memories", "Keyword/filter search over the caller's memories.", tools::search_memories::schema()),
            ("update_memory", "Patch an existing memory in place.", tools::update_memory::schema()),
            ("delete_memory", "Soft-delete a memory.", tools::delete_memory::schema()),
            ("get_memory_statistics", "Aggregate memory counts and dates for the caller.", tools::get_memory_statistics::schema()),
            ("bulk_create_memories", "Create many memories in one call.", tools::bulk_create_memories::schema()),
            ("create_large_memory", "Create a memory whose content exceeds the inline chunking threshold.", tools::create_large_memory::schema()),
            ("categorize_memories", "Rule-based categorization over the caller's active memories.", tools::categorize_memories::schema()),
            ("analyze_content", "Deterministic keyword/sentiment/complexity/readability analysis.", tools::analyze_content::schema()),
            ("summarize_memory", "Extractive summary of one memory.", tools::summarize_memory::schema()),
            ("create_context", "Create a named grouping of memories.", tools::create_context::schema()),
            ("create_relation", "Link two memories with a typed, weighted edge.", tools::create_relation::schema()),
            ("get_memory_relations", "List relations touching one memory.", tools::get_memory_relations::schema()),
            ("bulk_create_relations", "Create many relations in one call.", tools::bulk_create_relations::schema()),
            ("search_semantic", "Embedding-based nearest-neighbor search.", tools::search_semantic::schema()),
            ("analyze_knowledge_graph", "Overview/centrality/connections views over the relation graph.", tools::analyze_knowledge_graph::schema()),
            ("ingest_knowledge", "Split a document into chapters and store each as a linked memory.", tools::ingest_knowledge::schema()),
            ("index_knowledge_batch", "Run ingest_knowledge over several documents at once.", tools::index_knowledge_batch::schema()),
            ("find_similar_knowledge", "Semantic search restricted to ingested memories.", tools::find_similar_knowledge::schema()),
        ];

        let tools = descriptions
            .into_iter()
            .map(|(name, description, input_schema)| ToolDescription {
                name: name.to_string(),
                description: Some(description.to_string()),
                input_schema,
            })
            .collect();

        serde_json::to_value(ListToolsResult { tools }).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        if !self.initialized {
            return Err(JsonRpcError::server_not_initialized());
        }

        let request: CallToolRequest = match params {
            Some(v) => serde_json::from_value(v).map_err(|e| JsonRpcError::invalid_params(&e.to_string()))?,
            None => return Err(JsonRpcError::invalid_params("missing tools/call params")),
        };

        self.tool_call_count.fetch_add(1, Ordering::Relaxed);
        let owner_id = self.owner_id.as_str();
        let engine = self.engine.as_ref();

        tracing::info!(tool = %request.name, "dispatching tool call");
        let outcome = self.dispatch_tool(&request.name, engine, owner_id, request.arguments).await;

        let call_result = match outcome {
            Ok(value) => CallToolResult::ok(value),
            Err(message) => CallToolResult::error(&message),
        };

        serde_json::to_value(call_result).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }

    async fn dispatch_tool(
        &self,
        name: &str,
        engine: &MemoryEngine,
        owner_id: &str,
        args: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, String> {
        match name {
            "create_memory" => tools::create_memory::execute(engine, owner_id, args).await,
            "search_memories" => tools::search_memories::execute(engine, owner_id, args),
            "update_memory" => tools::update_memory::execute(engine, owner_id, args).await,
            "delete_memory" => tools::delete_memory::execute(engine, owner_id, args).await,
            "get_memory_statistics" => tools::get_memory_statistics::execute(engine, owner_id, args),
            "bulk_create_memories" => tools::bulk_create_memories::execute(engine, owner_id, args).await,
            "create_large_memory" => tools::create_large_memory::execute(engine, owner_id, args).await,
            "categorize_memories" => tools::categorize_memories::execute(engine, owner_id, args),
            "analyze_content" => tools::analyze_content::execute(engine, owner_id, args),
            "summarize_memory" => tools::summarize_memory::execute(engine, owner_id, args),
            "create_context" => tools::create_context::execute(engine, owner_id, args),
            "create_relation" => tools::create_relation::execute(engine, owner_id, args),
            "get_memory_relations" => tools::get_memory_relations::execute(engine, owner_id, args),
            "bulk_create_relations" => tools::bulk_create_relations::execute(engine, owner_id, args),
            "search_semantic" => tools::search_semantic::execute(engine, owner_id, args).await,
            "analyze_knowledge_graph" => tools::analyze_knowledge_graph::execute(engine, owner_id, args),
            "ingest_knowledge" => tools::ingest_knowledge::execute(engine, owner_id, args).await,
            "index_knowledge_batch" => tools::index_knowledge_batch::execute(engine, owner_id, args).await,
            "find_similar_knowledge" => tools::find_similar_knowledge::execute(engine, owner_id, args).await,
            other => Err(format!("unknown tool: {other}")),
        }
    }

    fn handle_resources_list(&self) -> Result<serde_json::Value, JsonRpcError> {
        let resources = vec![ResourceDescription {
            uri: "memory://summary".to_string(),
            name: "Memory statistics".to_string(),
            description: Some("Aggregate counts and dates for the caller's memories.".to_string()),
            mime_type: "application/json".to_string(),
        }];
        serde_json::to_value(ListResourcesResult { resources }).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }

    fn handle_resources_read(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let request: ReadResourceRequest = match params {
            Some(v) => serde_json::from_value(v).map_err(|e| JsonRpcError::invalid_params(&e.to_string()))?,
            None => return Err(JsonRpcError::invalid_params("missing resources/read params")),
        };

        if request.uri != "memory://summary" {
            return Err(JsonRpcError::resource_not_found(&request.uri));
        }

        let stats = self
            .engine
            .get_memory_statistics(&self.owner_id)
            .map_err(|e| JsonRpcError::from_engine_error(&e))?;
        let text = serde_json::to_string_pretty(&stats).map_err(|e| JsonRpcError::internal_error(&e.to_string()))?;

        let result = ReadResourceResult {
            contents: vec![ResourceContent { uri: request.uri, mime_type: "application/json".to_string(), text }],
        };
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoria_core::embeddings::{EmbeddingProvider, LocalEmbeddingProvider};
    use memoria_core::{Config, Storage};

    fn test_server() -> (McpServer, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = dir.path().to_path_buf();
        let storage = Arc::new(Storage::new(config).unwrap());
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(LocalEmbeddingProvider::new());
        let engine = Arc::new(MemoryEngine::new(storage, embeddings).unwrap());
        (McpServer::new(engine, "local".to_string()), dir)
    }

    fn request(method: &str, params: Option<serde_json::Value>) -> JsonRpcRequest {
        JsonRpcRequest { jsonrpc: "2.0".to_string(), id: Some(serde_json::json!(1)), method: method.to_string(), params }
    }

    #[tokio::test]
    async fn notifications_produce_no_response() {
        let (mut server, _dir) = test_server();
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(server.handle_request(notification).await.is_none());
    }

    #[tokio::test]
    async fn tools_list_requires_initialize_first() {
        let (mut server, _dir) = test_server();
        let response = server.handle_request(request("tools/list", None)).await.unwrap();
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn initialize_then_tools_list_then_call() {
        let (mut server, _dir) = test_server();
        let init_params = serde_json::json!({"protocolVersion": MCP_VERSION, "capabilities": {}, "clientInfo": {}});
        let init = server.handle_request(request("initialize", Some(init_params))).await.unwrap();
        assert!(init.result.is_some());

        let list = server.handle_request(request("tools/list", None)).await.unwrap();
        let tools = list.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 19);

        let call_params = serde_json::json!({"name": "create_memory", "arguments": {"title": "t", "content": "c"}});
        let call = server.handle_request(request("tools/call", Some(call_params))).await.unwrap();
        assert!(call.result.is_some());
    }

    #[tokio::test]
    async fn unknown_tool_reports_as_tool_error_not_rpc_error() {
        let (mut server, _dir) = test_server();
        let init_params = serde_json::json!({"protocolVersion": MCP_VERSION, "capabilities": {}, "clientInfo": {}});
        server.handle_request(request("initialize", Some(init_params))).await;

        let call_params = serde_json::json!({"name": "not_a_tool", "arguments": {}});
        let call = server.handle_request(request("tools/call", Some(call_params))).await.unwrap();
        let result = call.result.unwrap();
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn resources_read_returns_summary() {
        let (mut server, _dir) = test_server();
        let init_params = serde_json::json!({"protocolVersion": MCP_VERSION, "capabilities": {}, "clientInfo": {}});
        server.handle_request(request("initialize", Some(init_params))).await;

        let read_params = serde_json::json!({"uri": "memory://summary"});
        let response = server.handle_request(request("resources/read", Some(read_params))).await.unwrap();
        assert!(response.result.is_some());
    }
}
