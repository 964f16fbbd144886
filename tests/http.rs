use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use dialog_relay::config::ServerSettings;
use dialog_relay::server;
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

fn test_settings() -> ServerSettings {
    let mut settings = ServerSettings::default();
    // Stub the dialog tool with echo so local runs are observable
    settings.dialog.unix_tool = PathBuf::from("/bin/echo");
    settings.dialog.windows_tool = PathBuf::from("/bin/echo");
    settings.dialog.binaries_dir = PathBuf::from("/nonexistent/binaries");
    settings.http.asset_dir = PathBuf::from("/nonexistent/assets");
    settings
}

fn test_app() -> Router {
    server::build_router(Arc::new(test_settings()))
}

async fn post_json(app: Router, path: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: Router, path: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn execute_local_echo_round_trip() {
    let (status, body) = post_json(test_app(), "/execute", r#"{"message":"hi","mode":"local"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["code"], 0);
    assert_eq!(body["message"], "hi");
    assert_eq!(body["executionMode"], "local");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn execute_unknown_mode_falls_back_to_local() {
    let (status, body) =
        post_json(test_app(), "/execute", r#"{"message":"hi","mode":"bogus"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["executionMode"], "local");
    assert_eq!(body["message"], "hi");
}

#[tokio::test]
async fn execute_defaults_message_when_absent() {
    let (status, body) = post_json(test_app(), "/execute", r#"{"mode":"local"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Default message");
}

#[tokio::test]
async fn execute_ssh_without_credentials_fails_fast() {
    let (status, body) = post_json(
        test_app(),
        "/execute",
        r#"{"message":"hi","mode":"remote_ssh","endpoint":"10.0.0.5"}"#,
    )
    .await;

    // Strategy failure is encoded in the body, not the HTTP status
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], -1);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("SSH credentials required"));
}

#[tokio::test]
async fn execute_wmi_without_password_fails_fast() {
    let (status, body) = post_json(
        test_app(),
        "/execute",
        r#"{"message":"hi","mode":"remote_wmi","endpoint":"10.0.0.5","credentials":{"username":"admin"}}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("WMI credentials"));
}

#[tokio::test]
async fn execute_malformed_json_is_bad_request() {
    let (status, body) = post_json(test_app(), "/execute", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], -1);
    assert!(body["error"].as_str().unwrap().contains("Invalid request"));
}

#[tokio::test]
async fn test_local_echoes_message_and_title() {
    let (status, body) = post_json(
        test_app(),
        "/test-local",
        r#"{"message":"Local connection test","title":"Test"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["code"], 0);
    assert_eq!(body["executionMode"], "local_test");
    assert_eq!(body["message"], "Local test successful: Local connection test (Test)");
    assert!(body["hostname"].is_string());
}

#[tokio::test]
async fn config_advertises_modes_and_defaults() {
    let (status, body) = get_json(test_app(), "/config").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["executionModes"].as_array().unwrap().len(), 4);
    assert_eq!(body["defaultPort"], 8080);
    assert_eq!(body["defaultTimeout"], 30000);
    assert_eq!(body["supportedProtocols"][0], "http");
    assert!(body["serverInfo"]["hostname"].is_string());
}

#[tokio::test]
async fn executables_missing_directory_is_empty_list() {
    let (status, body) = get_json(test_app(), "/executables").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["executables"], serde_json::json!([]));
}

#[tokio::test]
async fn system_info_stable_fields_are_idempotent() {
    let (_, first) = get_json(test_app(), "/system-info").await;
    let (_, second) = get_json(test_app(), "/system-info").await;

    assert_eq!(first["platform"], second["platform"]);
    assert_eq!(first["arch"], second["arch"]);
    assert_eq!(first["hostname"], second["hostname"]);
    assert_eq!(first["supportedModes"], second["supportedModes"]);
    assert_eq!(first["supportedModes"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn unknown_path_is_plain_text_not_found() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/no-such-file.html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"File not found");
}

#[tokio::test]
async fn static_file_served_with_mime_type() {
    let dir = std::env::temp_dir().join(format!("dialog_relay_assets_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<html></html>").unwrap();

    let mut settings = test_settings();
    settings.http.asset_dir = dir.clone();
    let app = server::build_router(Arc::new(settings));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html"
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn path_traversal_is_rejected() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/../Cargo.toml")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/execute")
                .header(header::ORIGIN, "http://example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
