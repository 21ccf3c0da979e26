//! Wire types for the line-delimited JSON-RPC 2.0 protocol MCP speaks
//! over stdio (see `protocol::stdio`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP spec version this server implements.
pub const MCP_VERSION: &str = "2025-03-26";

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), id, result: Some(result), error: None }
    }

    pub fn error(id: Option<Value>, error: JsonRpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), id, result: None, error: Some(error) }
    }
}

/// Codes for errors that happen at the JSON-RPC/MCP transport layer
/// itself — malformed envelopes, unknown methods, calls made before
/// `initialize`. These are distinct from the memory engine's own wire
/// codes (`memoria_core::ErrorCode`, §7 of the memory protocol), which
/// `from_engine_error` carries through unchanged instead of collapsing
/// into one of these.
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
    ResourceNotFound = -32002,
    ServerNotInitialized = -32003,
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code as i32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: ErrorCode, message: &str) -> Self {
        Self { code: code.into(), message: message.to_string(), data: None }
    }

    pub fn parse_error() -> Self {
        Self::new(ErrorCode::ParseError, "Parse error")
    }

    pub fn method_not_found() -> Self {
        Self::new(ErrorCode::MethodNotFound, "Method not found")
    }

    pub fn method_not_found_with_message(message: &str) -> Self {
        Self::new(ErrorCode::MethodNotFound, message)
    }

    pub fn invalid_params(message: &str) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn server_not_initialized() -> Self {
        Self::new(ErrorCode::ServerNotInitialized, "Server not initialized")
    }

    pub fn resource_not_found(uri: &str) -> Self {
        Self::new(ErrorCode::ResourceNotFound, &format!("Resource not found: {uri}"))
    }

    /// Converts an engine error into a JSON-RPC error using the
    /// engine's own stable wire code (§7) rather than a generic
    /// JSON-RPC one, so `memory://summary` reads and tool calls that
    /// fail inside the engine surface the same code over MCP that the
    /// REST transport maps to an HTTP status for the same failure.
    pub fn from_engine_error(err: &memoria_core::EngineError) -> Self {
        Self { code: err.code().as_i32(), message: err.to_string(), data: None }
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

#[cfg(test)]
mod tests {
    use super::*;
    use memoria_core::EngineError;

    #[test]
    fn notification_has_no_id() {
        let notification = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: "notify".to_string(),
            params: None,
        };
        assert!(notification.id.is_none());
    }

    #[test]
    fn request_round_trips_through_json() {
        let request = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(Value::Number(1.into())),
            method: "tools/call".to_string(),
            params: Some(serde_json::json!({"name": "create_memory"})),
        };
        let json = serde_json::to_string(&request).unwrap();
        let parsed: JsonRpcRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.method, "tools/call");
        assert!(parsed.id.is_some());
    }

    #[test]
    fn success_response_carries_no_error() {
        let response = JsonRpcResponse::success(Some(Value::Number(1.into())), serde_json::json!({"ok": true}));
        assert!(response.result.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn error_response_carries_no_result() {
        let response = JsonRpcResponse::error(Some(Value::Number(1.into())), JsonRpcError::method_not_found());
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, ErrorCode::MethodNotFound as i32);
    }

    /// `from_engine_error` must forward the engine's own wire code
    /// (§7), not re-derive a generic JSON-RPC one — a caller scripting
    /// against the MCP transport sees the same `-32010` for a missing
    /// memory that the REST transport maps to HTTP 404 for.
    #[test]
    fn engine_errors_keep_their_own_wire_code() {
        let not_found = EngineError::NotFound("mem-1".to_string());
        let error = JsonRpcError::from_engine_error(&not_found);
        assert_eq!(error.code, not_found.code().as_i32());
        assert_ne!(error.code, ErrorCode::InternalError as i32);

        let access_denied = EngineError::AccessDenied("owner-1".to_string());
        let error = JsonRpcError::from_engine_error(&access_denied);
        assert_eq!(error.code, access_denied.code().as_i32());
        assert_ne!(error.code, not_found.code().as_i32());
    }
}
