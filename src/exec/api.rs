use super::{now_iso, Credentials, ExecutionResult};
use crate::config::ServerSettings;
use serde_json::{json, Value};
use std::time::Duration;

/// Run the dialog action through a remote agent's HTTP API.
///
/// POSTs to `{endpoint}/execute` and passes the agent's JSON response
/// through verbatim, re-tagged with this strategy's mode, the endpoint, and
/// a fresh timestamp. The agent owns `success`/`message`/`error`/`code`.
pub async fn run_remote_api(
    message: &str,
    title: Option<&str>,
    endpoint: Option<&str>,
    credentials: Option<&Credentials>,
    settings: &ServerSettings,
) -> Value {
    let endpoint = match endpoint {
        Some(endpoint) if !endpoint.trim().is_empty() => endpoint.to_string(),
        _ => return failure_value("Endpoint required for API execution"),
    };

    let url = format!("{}/execute", base_url(&endpoint));
    let api_key = credentials.and_then(|c| c.api_key.clone());
    let timeout = Duration::from_secs(settings.remote.timeout_secs);

    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => return failure_value(format!("API execution failed: {}", e)),
    };

    let mut body = serde_json::Map::new();
    body.insert("message".to_string(), json!(message));
    if let Some(title) = title {
        body.insert("title".to_string(), json!(title));
    }
    if let Some(key) = &api_key {
        body.insert("apiKey".to_string(), json!(key));
    }
    let body = Value::Object(body);

    let mut request = client.post(&url).json(&body);
    if let Some(key) = &api_key {
        request = request.header("Authorization", format!("Bearer {}", key));
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            tracing::warn!("API request to {} timed out", url);
            return failure_value("API request timeout");
        }
        Err(e) => return failure_value(format!("API execution failed: {}", e)),
    };

    match response.json::<Value>().await {
        Ok(mut result) => {
            if let Some(map) = result.as_object_mut() {
                map.insert("executionMode".to_string(), json!("remote_api"));
                map.insert("endpoint".to_string(), json!(endpoint));
                map.insert("timestamp".to_string(), json!(now_iso()));
            }
            result
        }
        Err(e) => failure_value(format!("API response parsing failed: {}", e)),
    }
}

fn failure_value(error: impl Into<String>) -> Value {
    serde_json::to_value(ExecutionResult::failure(error)).unwrap_or(Value::Null)
}

/// Resolve an endpoint to a base URL. The scheme is https only when the
/// endpoint says so explicitly; a bare host gets the default agent port 443.
fn base_url(endpoint: &str) -> String {
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        endpoint.trim_end_matches('/').to_string()
    } else if endpoint.contains(':') {
        format!("http://{}", endpoint)
    } else {
        format!("http://{}:443", endpoint)
    }
}
