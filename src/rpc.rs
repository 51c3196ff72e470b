use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::QueryError,
    format::build_result,
    models::{PredictionsResult, ToolCallInput},
    query::resolve_predictions,
    AppState,
};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

pub const TOOL_NAME: &str = "get_match_predictions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text".to_string(),
                text: text.into(),
            }],
            structured_content: None,
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(message)
        }
    }
}

/// Validates one JSON-RPC request body and dispatches it. Every outcome,
/// protocol errors included, is a well-formed response.
pub async fn handle_request(state: &AppState, body: &[u8], now: DateTime<Utc>) -> JsonRpcResponse {
    let raw = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => value,
            Err(err) => {
                debug!("Rejecting unparsable request body: {err}");
                return JsonRpcResponse::failure(Value::Null, PARSE_ERROR, "Parse error: Invalid JSON");
            }
        }
    };

    let Value::Object(request) = raw else {
        return JsonRpcResponse::failure(
            Value::Null,
            INVALID_REQUEST,
            "Invalid request: expected a JSON object",
        );
    };

    let id = request
        .get("id")
        .filter(|id| id.is_string() || id.is_number())
        .cloned();

    if request.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return JsonRpcResponse::failure(
            id.unwrap_or(Value::Null),
            INVALID_REQUEST,
            "Invalid JSON-RPC version",
        );
    }

    let Some(id) = id else {
        return JsonRpcResponse::failure(Value::Null, INVALID_REQUEST, "Missing request ID");
    };

    let Some(method) = request
        .get("method")
        .and_then(Value::as_str)
        .filter(|method| !method.is_empty())
    else {
        return JsonRpcResponse::failure(id, INVALID_REQUEST, "Missing method");
    };

    match method {
        "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_definitions() })),
        "tools/call" => call_tool(state, id, request.get("params"), now).await,
        other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
    }
}

async fn call_tool(
    state: &AppState,
    id: Value,
    params: Option<&Value>,
    now: DateTime<Utc>,
) -> JsonRpcResponse {
    let name = params.and_then(|p| p.get("name")).and_then(Value::as_str);
    if name != Some(TOOL_NAME) {
        return JsonRpcResponse::failure(
            id,
            INVALID_PARAMS,
            format!("Unknown tool: {}", name.unwrap_or("<missing>")),
        );
    }

    let arguments = params
        .and_then(|p| p.get("arguments"))
        .cloned()
        .unwrap_or_else(|| json!({}));

    let trace_id = Uuid::new_v4().to_string();
    let result = match run_prediction_tool(state, &arguments, now).await {
        Ok(result) => {
            info!(trace_id = %trace_id, league = %result.league, matchweek = result.matchweek, count = result.count, "Resolved match predictions");
            tool_success(&result)
        }
        Err(err) => {
            match &err {
                QueryError::Store(store_err) => {
                    warn!(trace_id = %trace_id, "Prediction lookup failed: {store_err}")
                }
                other => info!(trace_id = %trace_id, "Prediction query returned no result: {other}"),
            }
            ToolCallResult::error(err.to_string())
        }
    };

    if state.config.log_payloads {
        debug!(trace_id = %trace_id, arguments = %arguments, "Tool call payload");
    }

    match serde_json::to_value(&result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(err) => {
            warn!(trace_id = %trace_id, "Failed encoding tool result: {err}");
            JsonRpcResponse::success(
                id,
                json!({
                    "content": [{ "type": "text", "text": "Tool execution failed" }],
                    "isError": true,
                }),
            )
        }
    }
}

pub async fn run_prediction_tool(
    state: &AppState,
    arguments: &Value,
    now: DateTime<Utc>,
) -> Result<PredictionsResult, QueryError> {
    let input = ToolCallInput::from_arguments(arguments)?;
    let query = resolve_predictions(state.store.as_ref(), &input).await?;
    Ok(build_result(
        &query,
        now,
        state.config.display_zone,
        &state.config.app_store_link,
    ))
}

fn tool_success(result: &PredictionsResult) -> ToolCallResult {
    let structured = match serde_json::to_value(result) {
        Ok(value) => value,
        Err(err) => return ToolCallResult::error(format!("Tool execution failed: {err}")),
    };
    let text = serde_json::to_string_pretty(&structured).unwrap_or_else(|_| structured.to_string());

    ToolCallResult {
        structured_content: Some(structured),
        ..ToolCallResult::text(text)
    }
}

pub fn tool_definitions() -> Vec<Value> {
    vec![tool_def(
        TOOL_NAME,
        "Get AI Match Predictions",
        "Get AI-powered predictions for Premier League and Champions League matches including half-time score, full-time score, next goal scorer, and corner predictions. Real-time predictions available in FootballBin iOS app.",
        json!({
            "type": "object",
            "properties": {
                "league": {
                    "type": "string",
                    "description": "League to get predictions for. Accepts: \"premier_league\", \"epl\", \"pl\", \"champions_league\", \"ucl\", \"cl\""
                },
                "matchweek": {
                    "type": "number",
                    "description": "Matchweek number (optional, defaults to current matchweek)"
                },
                "home_team": {
                    "type": "string",
                    "description": "Filter by home team name (optional, e.g., \"chelsea\", \"arsenal\", \"man_utd\")"
                },
                "away_team": {
                    "type": "string",
                    "description": "Filter by away team name (optional, e.g., \"liverpool\", \"wolves\")"
                }
            },
            "required": ["league"]
        }),
    )]
}

fn tool_def(name: &str, title: &str, description: &str, input_schema: Value) -> Value {
    json!({
        "name": name,
        "title": title,
        "description": description,
        "inputSchema": input_schema,
    })
}
