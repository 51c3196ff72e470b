use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::{
    error::BridgeError,
    rpc::{
        tool_definitions, JsonRpcResponse, ToolCallResult, INTERNAL_ERROR, INVALID_PARAMS,
        INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, TOOL_NAME,
    },
};

pub const SERVER_NAME: &str = "footballbin-mcp-server";
const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Forwards tool calls to the remote JSON-RPC endpoint. One request per call,
/// no retries.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    endpoint: String,
    http: reqwest::Client,
}

impl BridgeClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn call_tool(&self, arguments: &Value) -> Result<Value, BridgeError> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": TOOL_NAME,
                "arguments": arguments,
            },
            "id": Utc::now().timestamp_millis(),
        });

        let response = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status(status));
        }

        let bytes = response.bytes().await?;
        let envelope: JsonRpcResponse = serde_json::from_slice(&bytes)?;
        if let Some(err) = envelope.error {
            let message = if err.message.is_empty() {
                "API error".to_string()
            } else {
                err.message
            };
            return Err(BridgeError::Rpc(message));
        }

        unwrap_tool_result(envelope.result)
    }
}

/// Prefers `structuredContent`, then the first text block parsed as JSON,
/// then the raw result.
pub fn unwrap_tool_result(result: Option<Value>) -> Result<Value, BridgeError> {
    let Some(result) = result else {
        return Ok(Value::Null);
    };

    if let Some(structured) = result.get("structuredContent").filter(|v| !v.is_null()) {
        return Ok(structured.clone());
    }

    let text = result
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty());
    if let Some(text) = text {
        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(BridgeError::Tool(text.to_string()));
        }
        return Ok(serde_json::from_str(text)?);
    }

    Ok(result)
}

/// Newline-delimited JSON-RPC over a local byte stream (stdin/stdout in the
/// bridge binary).
pub struct StdioBridge {
    client: BridgeClient,
}

impl StdioBridge {
    pub fn new(client: BridgeClient) -> Self {
        Self { client }
    }

    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(endpoint = %self.client.endpoint(), "FootballBin bridge running on stdio");

        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("Received EOF, shutting down");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let Some(response) = self.handle_line(trimmed).await else {
                        continue;
                    };

                    let mut payload = match serde_json::to_vec(&response) {
                        Ok(payload) => payload,
                        Err(err) => {
                            error!("Failed to serialize response: {err}");
                            continue;
                        }
                    };
                    payload.push(b'\n');
                    writer.write_all(&payload).await?;
                    writer.flush().await?;
                }
                Err(err) => {
                    error!("Failed to read from stdin: {err}");
                    break;
                }
            }
        }

        info!("FootballBin bridge shutting down");
        Ok(())
    }

    /// `None` for notifications, which get no reply.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {err}"),
                ))
            }
        };

        let id = request.get("id").cloned().filter(|id| !id.is_null());
        if request.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return Some(JsonRpcResponse::failure(
                id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "Invalid JSON-RPC version",
            ));
        }

        let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
        let Some(id) = id else {
            debug!(method, "Ignoring notification");
            return None;
        };

        let params = request.get("params").cloned().unwrap_or(Value::Null);
        let response = match method {
            "initialize" => JsonRpcResponse::success(id, initialize_result(&params)),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.tools_call(id, &params).await,
            "" => JsonRpcResponse::failure(id, INVALID_REQUEST, "Missing method"),
            other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
        };
        Some(response)
    }

    async fn tools_call(&self, id: Value, params: &Value) -> JsonRpcResponse {
        let name = params.get("name").and_then(Value::as_str);
        if name != Some(TOOL_NAME) {
            return JsonRpcResponse::failure(
                id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", name.unwrap_or("<missing>")),
            );
        }

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        let result = match self.client.call_tool(&arguments).await {
            Ok(value) => {
                let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
                ToolCallResult::text(text)
            }
            Err(err) => {
                warn!("Remote tool call failed: {err}");
                ToolCallResult::error(format!("Error: {err}"))
            }
        };

        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(err) => {
                JsonRpcResponse::failure(id, INTERNAL_ERROR, format!("Failed encoding result: {err}"))
            }
        }
    }
}

fn initialize_result(params: &Value) -> Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);

    json!({
        "protocolVersion": protocol_version,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": {}
        }
    })
}
