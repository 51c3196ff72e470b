use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Method, Response, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;

use crate::{rpc, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", post(mcp).options(preflight))
        .route("/mcp", post(mcp).options(preflight))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true, "timestamp": Utc::now() }))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// JSON-RPC errors travel with HTTP 200 so callers can read them.
pub async fn mcp(State(state): State<AppState>, body: Bytes) -> Response<Body> {
    let now = Utc::now();
    if state.config.log_payloads {
        debug!(body = %String::from_utf8_lossy(&body), "MCP request payload");
    }

    let response = rpc::handle_request(&state, &body, now).await;
    let payload = serde_json::to_vec(&response).unwrap_or_else(|_| b"{}".to_vec());
    if state.config.log_payloads {
        debug!(body = %String::from_utf8_lossy(&payload), "MCP response payload");
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .unwrap_or_else(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error":{"code":"RESPONSE_BUILD_FAILED","message":"Failed building MCP response"}})),
            )
                .into_response()
        })
}
