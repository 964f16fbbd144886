pub mod api;
pub mod local;
pub mod ssh;
pub mod wmi;

use crate::config::ServerSettings;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Execution strategy selected from the request's mode string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Local,
    RemoteSsh,
    RemoteWmi,
    RemoteApi,
}

impl ExecutionMode {
    /// All modes the server supports, in wire form
    pub const ALL: [&'static str; 4] = ["local", "remote_ssh", "remote_wmi", "remote_api"];

    /// Parse a free-form mode string. Anything unrecognized (including
    /// absence) falls back to local execution; this is intentional, not an
    /// error.
    pub fn parse(mode: Option<&str>) -> Self {
        match mode {
            Some("remote_ssh") => ExecutionMode::RemoteSsh,
            Some("remote_wmi") => ExecutionMode::RemoteWmi,
            Some("remote_api") => ExecutionMode::RemoteApi,
            _ => ExecutionMode::Local,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Local => "local",
            ExecutionMode::RemoteSsh => "remote_ssh",
            ExecutionMode::RemoteWmi => "remote_wmi",
            ExecutionMode::RemoteApi => "remote_api",
        }
    }
}

/// Credential bag sent by the client; the chosen strategy decides which
/// fields are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Body of POST /execute
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

fn default_message() -> String {
    "Default message".to_string()
}

/// Normalized outcome shape every strategy produces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub timestamp: String,
}

impl ExecutionResult {
    /// Single-shape failure used for precondition and transport errors
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: String::new(),
            error: error.into(),
            code: -1,
            execution_mode: None,
            endpoint: None,
            hostname: None,
            platform: None,
            timestamp: now_iso(),
        }
    }
}

/// Current time as an ISO-8601 string with millisecond precision
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Dispatch a request to exactly one execution strategy.
///
/// Every path yields a JSON result body; strategy failures are encoded in
/// the body (`success:false`, `code:-1`), never raised to the HTTP layer.
/// The remote API strategy passes the peer's JSON through verbatim, so the
/// outcome is a raw value rather than an `ExecutionResult`.
pub async fn dispatch(request: ExecutionRequest, settings: &ServerSettings) -> serde_json::Value {
    let mode = ExecutionMode::parse(request.mode.as_deref());
    let message = if request.message.trim().is_empty() {
        default_message()
    } else {
        request.message.clone()
    };
    let title = request.title.as_deref().filter(|t| !t.trim().is_empty());

    tracing::info!(
        "Executing on target: {} with mode: {}",
        request.endpoint.as_deref().unwrap_or("local"),
        mode.as_str()
    );

    let result = match mode {
        ExecutionMode::Local => local::run_local(&message, title, settings).await,
        ExecutionMode::RemoteSsh => {
            ssh::run_remote_ssh(
                &message,
                title,
                request.endpoint.as_deref(),
                request.credentials.as_ref(),
                settings,
            )
            .await
        }
        ExecutionMode::RemoteWmi => {
            wmi::run_remote_wmi(
                &message,
                title,
                request.endpoint.as_deref(),
                request.credentials.as_ref(),
                settings,
            )
            .await
        }
        ExecutionMode::RemoteApi => {
            // Pass-through: the remote agent owns the result fields
            return api::run_remote_api(
                &message,
                title,
                request.endpoint.as_deref(),
                request.credentials.as_ref(),
                settings,
            )
            .await;
        }
    };

    serde_json::to_value(&result).unwrap_or_else(|e| {
        serde_json::json!({
            "success": false,
            "message": "",
            "error": format!("Result serialization failed: {}", e),
            "code": -1,
            "timestamp": now_iso(),
        })
    })
}
