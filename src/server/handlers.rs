use crate::config::ServerSettings;
use crate::exec::{self, now_iso, ExecutionMode, ExecutionRequest, ExecutionResult};
use crate::system;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// GET /config: client bootstrap information
pub async fn config(State(settings): State<Arc<ServerSettings>>) -> impl IntoResponse {
    Json(json!({
        "serverInfo": {
            "platform": std::env::consts::OS,
            "hostname": sys_info::hostname().unwrap_or_else(|_| "unknown".to_string()),
            "timestamp": now_iso(),
        },
        "executionModes": ExecutionMode::ALL,
        "defaultPort": settings.remote.agent_port,
        "defaultTimeout": settings.remote.timeout_secs * 1000,
        "supportedProtocols": ["http", "https"],
    }))
}

#[derive(Debug, Deserialize)]
struct TestLocalRequest {
    message: String,
    #[serde(default)]
    title: Option<String>,
}

/// POST /test-local: result-shaped echo, no process spawned
pub async fn test_local(body: String) -> impl IntoResponse {
    let request: TestLocalRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => return bad_request(e),
    };

    let suffix = request
        .title
        .map(|t| format!(" ({})", t))
        .unwrap_or_default();

    let result = ExecutionResult {
        success: true,
        message: format!("Local test successful: {}{}", request.message, suffix),
        error: String::new(),
        code: 0,
        execution_mode: Some("local_test".to_string()),
        endpoint: None,
        hostname: Some(sys_info::hostname().unwrap_or_else(|_| "unknown".to_string())),
        platform: None,
        timestamp: now_iso(),
    };

    (StatusCode::OK, Json(serde_json::to_value(result).unwrap_or_default()))
}

/// POST /execute: parse the request and hand it to the dispatcher.
///
/// Strategy failures come back as HTTP 200 with `success:false` in the
/// body; only an unparseable body is a 400.
pub async fn execute(
    State(settings): State<Arc<ServerSettings>>,
    body: String,
) -> impl IntoResponse {
    let request: ExecutionRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => return bad_request(e),
    };

    let result = exec::dispatch(request, &settings).await;
    (StatusCode::OK, Json(result))
}

/// GET /executables: bundled dialog-tool binaries
pub async fn executables(State(settings): State<Arc<ServerSettings>>) -> impl IntoResponse {
    let executables = system::list_executables(&settings.dialog.binaries_dir);
    Json(json!({ "executables": executables }))
}

/// GET /system-info: host introspection
pub async fn system_info() -> impl IntoResponse {
    Json(system::system_info())
}

fn bad_request(error: serde_json::Error) -> (StatusCode, Json<serde_json::Value>) {
    let result = ExecutionResult::failure(format!("Invalid request: {}", error));
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::to_value(result).unwrap_or_default()),
    )
}
