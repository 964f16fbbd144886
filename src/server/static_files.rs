use crate::config::ServerSettings;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Component;
use std::sync::Arc;

static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("html", "text/html"),
        ("js", "text/javascript"),
        ("css", "text/css"),
        ("json", "application/json"),
        ("png", "image/png"),
        ("ico", "image/x-icon"),
    ])
});

/// Fallback handler: serve a file from the asset directory.
///
/// `/` maps to `index.html`. Missing files are a plain-text 404, files that
/// exist but cannot be read a plain-text 500, matching the front-end's
/// expectations.
pub async fn serve_static(State(settings): State<Arc<ServerSettings>>, uri: Uri) -> Response {
    let request_path = uri.path().trim_start_matches('/');
    let request_path = if request_path.is_empty() {
        "index.html"
    } else {
        request_path
    };

    // Confine lookups to the asset directory
    let relative = std::path::Path::new(request_path);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return not_found();
    }

    let file_path = settings.http.asset_dir.join(relative);
    if !file_path.is_file() {
        return not_found();
    }

    let content_type = file_path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|e| MIME_TYPES.get(e).copied())
        .unwrap_or("text/plain");

    match tokio::fs::read(&file_path).await {
        Ok(content) => {
            ([(header::CONTENT_TYPE, content_type)], content).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to read static file {:?}: {}", file_path, e);
            server_error()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "File not found").into_response()
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}
