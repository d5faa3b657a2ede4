//! JSON-RPC method routing.

use serde_json::Value;
use std::sync::Arc;

use super::PROTOCOL_VERSION;
use crate::service::ServiceManager;
use crate::tools::{health, ToolRegistry};
use crate::types::{Error, Result};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// Routes MCP requests to tools and the health check.
#[derive(Debug)]
pub struct McpRouter {
    tools: ToolRegistry,
    service: Arc<ServiceManager>,
    service_name: String,
}

impl McpRouter {
    pub fn new(tools: ToolRegistry, service: Arc<ServiceManager>, service_name: impl Into<String>) -> Self {
        Self {
            tools,
            service,
            service_name: service_name.into(),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one decoded message. Notifications produce no response.
    pub async fn handle(&self, request: Value) -> Option<Value> {
        let Some(obj) = request.as_object() else {
            return Some(error_response(Value::Null, INVALID_REQUEST, "Request must be a JSON object"));
        };

        let id = obj.get("id").cloned();
        let method = obj.get("method").and_then(Value::as_str).unwrap_or("");
        let params = obj.get("params").cloned().unwrap_or(Value::Null);

        let Some(id) = id else {
            tracing::debug!("mcp_notification: method={}", method);
            return None;
        };

        if method.is_empty() {
            return Some(error_response(id, INVALID_REQUEST, "Missing method"));
        }

        tracing::debug!("mcp_request: method={}", method);
        let result = match method {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.tools_list()),
            "tools/call" => self.tools_call(params).await,
            "health" => self.health().await,
            _ => Err(Error::not_found(format!("Method not found: {}", method))),
        };

        Some(match result {
            Ok(value) => success_response(id, value),
            Err(e) => error_response(id, e.to_rpc_code(), &e.to_string()),
        })
    }

    fn initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    fn tools_list(&self) -> Value {
        let tools: Vec<Value> = self.tools.list().iter().map(|t| t.to_definition()).collect();
        serde_json::json!({ "tools": tools })
    }

    /// Unknown tools are protocol errors; everything the tool itself reports
    /// comes back as an `isError` result.
    async fn tools_call(&self, params: Value) -> Result<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("tools/call requires a 'name'"))?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        if !self.tools.has_tool(name) {
            return Err(Error::not_found(format!("Unknown tool: {}", name)));
        }

        let outcome = match self.service.platform().await {
            Ok(platform) => self.tools.call(name, platform.as_ref(), arguments).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(value) => Ok(tool_result(&value, false)),
            Err(e) => {
                tracing::warn!("tool_call_failed: tool={}, error={}", name, e);
                Ok(tool_result(&Value::String(e.to_string()), true))
            }
        }
    }

    async fn health(&self) -> Result<Value> {
        let report = health::check(&self.service, &self.service_name).await;
        Ok(serde_json::to_value(report)?)
    }
}

fn tool_result(value: &Value, is_error: bool) -> Value {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    serde_json::json!({
        "content": [{"type": "text", "text": text}],
        "isError": is_error,
    })
}

pub fn success_response(id: Value, result: Value) -> Value {
    serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result})
}

pub fn error_response(id: Value, code: i64, message: &str) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": code, "message": message},
    })
}
