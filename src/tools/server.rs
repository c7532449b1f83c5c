//! Line-delimited JSON-RPC loop.
//!
//! One request per line in, one response per line out. Notifications get
//! no response. A line that is not JSON gets a parse error with a null id.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::handlers::{call_tool, tool_definitions};
use super::protocol::{
    CallToolResult, RpcRequest, RpcResponse, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::config::{APP_VERSION, TOOL_SERVER_NAME};
use crate::core_state::CoreState;

pub struct ToolServer {
    core: Arc<CoreState>,
    initialized: bool,
}

impl ToolServer {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            initialized: false,
        }
    }

    /// Whether the client has sent `notifications/initialized`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Handle one input line. Returns the serialized response, if any.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => Some(RpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {e}"),
            )),
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<RpcRequest>(value) {
                    Ok(request) => self.handle_request(request),
                    Err(e) => Some(RpcResponse::failure(
                        id,
                        INVALID_REQUEST,
                        format!("Invalid request: {e}"),
                    )),
                }
            }
        };

        response.and_then(|r| match serde_json::to_string(&r) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response");
                None
            }
        })
    }

    fn handle_request(&mut self, request: RpcRequest) -> Option<RpcResponse> {
        if !request.jsonrpc.is_empty() && request.jsonrpc != JSONRPC_VERSION {
            tracing::debug!(version = %request.jsonrpc, "Unexpected jsonrpc version");
        }

        if request.is_notification() {
            self.handle_notification(&request.method);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => RpcResponse::success(id, self.initialize_result()),
            "ping" => RpcResponse::success(id, json!({})),
            "tools/list" => RpcResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.tools_call(id, request.params),
            other => {
                tracing::debug!(method = other, "Unknown method");
                RpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
            }
        };
        Some(response)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" => {
                self.initialized = true;
                tracing::info!("Tool client initialized");
            }
            other => tracing::debug!(method = other, "Ignoring notification"),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": TOOL_SERVER_NAME,
                "version": APP_VERSION,
            }
        })
    }

    fn tools_call(&self, id: Value, params: Value) -> RpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return RpcResponse::failure(id, INVALID_PARAMS, "tools/call requires a tool name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let envelope = call_tool(&self.core, name, arguments);
        let result = CallToolResult::from_envelope(&envelope);
        match serde_json::to_value(result) {
            Ok(value) => RpcResponse::success(id, value),
            Err(e) => RpcResponse::failure(id, INVALID_PARAMS, e.to_string()),
        }
    }
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub async fn serve<R, W>(core: Arc<CoreState>, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut server = ToolServer::new(core);
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if let Some(response) = server.handle_line(&line) {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    tracing::info!("Tool client disconnected");
    Ok(())
}

/// Serve over the process's stdin/stdout.
pub async fn serve_stdio(core: Arc<CoreState>) -> std::io::Result<()> {
    tracing::info!(server = TOOL_SERVER_NAME, "Tool server listening on stdio");
    serve(core, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
