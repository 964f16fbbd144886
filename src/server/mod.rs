pub mod handlers;
pub mod static_files;

use crate::config::ServerSettings;
use crate::error::{AppError, AppResult};
use crate::exec::ExecutionMode;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Build the axum `Router` with all relay routes.
///
/// CORS is wide open (the browser front-end may be served from anywhere)
/// and the layer answers OPTIONS preflights with an empty 200. Anything
/// that matches no route falls through to the static asset handler.
pub fn build_router(settings: Arc<ServerSettings>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/config", get(handlers::config))
        .route("/test-local", post(handlers::test_local))
        .route("/execute", post(handlers::execute))
        .route("/executables", get(handlers::executables))
        .route("/system-info", get(handlers::system_info))
        .fallback(static_files::serve_static)
        .layer(cors)
        .with_state(settings)
}

/// Run the relay server until the process is stopped
pub async fn run(settings: ServerSettings) -> AppResult<()> {
    let addr: SocketAddr = format!("{}:{}", settings.http.bind, settings.http.port)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid bind address: {}", e)))?;

    let settings = Arc::new(settings);
    let app = build_router(settings);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Connection(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Dialog relay server running at http://{}", addr);
    tracing::info!(
        "Host platform: {} {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    tracing::info!(
        "Supported execution modes: {}",
        ExecutionMode::ALL.join(", ")
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Unknown(format!("Server error: {}", e)))?;

    Ok(())
}
