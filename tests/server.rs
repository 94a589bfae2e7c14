//! Router tests: every route is exercised in-process with `oneshot`, the
//! model replaced by a scripted client.

#![cfg(feature = "server")]

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{init_test_logging, ScriptedClient, DOCUMENT_REPLY};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use topic2docx::server::{create_router, AppState};
use topic2docx::{GenerationConfig, ServerConfig};

fn no_static() -> ServerConfig {
    ServerConfig {
        static_dir: None,
        ..ServerConfig::default()
    }
}

fn app_with(client: Arc<ScriptedClient>, output_dir: &Path) -> Router {
    init_test_logging();
    let config = GenerationConfig::builder()
        .output_dir(output_dir)
        .build()
        .unwrap();
    create_router(AppState::new(client, config), &no_static())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn given_running_server_when_health_check_then_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(ScriptedClient::replying("{}")), dir.path());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "ok": true }));
}

// ── /ai ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn given_blank_text_when_analyze_then_bad_request_without_model_call() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ScriptedClient::replying("{}"));
    let app = app_with(client.clone(), dir.path());

    let response = app.oneshot(post_json("/ai", json!({ "text": "   " }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Please provide some input text." })
    );
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn given_missing_text_field_when_analyze_then_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ScriptedClient::replying("{}"));
    let app = app_with(client.clone(), dir.path());

    let response = app.oneshot(post_json("/ai", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn given_empty_body_when_analyze_then_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(ScriptedClient::replying("{}")), dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ai")
                .header("content-type", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_fenced_reply_when_analyze_then_parsed_json_returned() {
    let dir = tempfile::tempdir().unwrap();
    let reply = "```json\n{\"productType\": \"jam\", \"totalProducts\": 120}\n```";
    let client = Arc::new(ScriptedClient::replying(reply));
    let app = app_with(client.clone(), dir.path());

    let response = app
        .oneshot(post_json("/ai", json!({ "text": "200 kg apples" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "productType": "jam", "totalProducts": 120 })
    );
    assert_eq!(client.calls(), 1);
    assert!(client.last_prompt().unwrap().ends_with("200 kg apples\n"));
}

#[tokio::test]
async fn given_non_json_reply_when_analyze_then_ok_with_raw_text() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(
        Arc::new(ScriptedClient::replying("I cannot answer that.")),
        dir.path(),
    );

    let response = app
        .oneshot(post_json("/ai", json!({ "text": "anything" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Invalid JSON format", "raw": "I cannot answer that." })
    );
}

#[tokio::test]
async fn given_model_failure_when_analyze_then_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(ScriptedClient::failing("quota")), dir.path());

    let response = app
        .oneshot(post_json("/ai", json!({ "text": "anything" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "message": "Server error!" }));
}

// ── /ai/transliterate ────────────────────────────────────────────────────────

#[tokio::test]
async fn given_cyrillic_text_when_transliterate_then_data_returned() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ScriptedClient::replying("```json\n{\"data\": \"Salom\"}\n```"));
    let app = app_with(client.clone(), dir.path());

    let response = app
        .oneshot(post_json("/ai/transliterate", json!({ "text": "Салом" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "data": "Salom" }));
    assert!(client.last_prompt().unwrap().contains("kirilcha to lotin"));
}

#[tokio::test]
async fn given_blank_text_when_transliterate_then_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ScriptedClient::replying("{}"));
    let app = app_with(client.clone(), dir.path());

    let response = app
        .oneshot(post_json("/ai/transliterate", json!({ "text": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(client.calls(), 0);
}

// ── /generate-docx ───────────────────────────────────────────────────────────

#[tokio::test]
async fn given_missing_topic_when_generate_then_bad_request_without_model_call() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ScriptedClient::replying(DOCUMENT_REPLY));
    let app = app_with(client.clone(), dir.path());

    let response = app
        .oneshot(post_json("/generate-docx", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "Topic is required" }));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn given_valid_reply_when_generate_then_docx_download_and_temp_file_removed() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ScriptedClient::replying(DOCUMENT_REPLY));
    let app = app_with(client.clone(), dir.path());

    let response = app
        .oneshot(post_json("/generate-docx", json!({ "topic": "Quyosh energiyasi" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename=\"Quyosh energiyasi.docx\""));

    // The temp file exists until the body has been consumed.
    assert!(dir.path().join("Quyosh_energiyasi.docx").exists());

    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"PK"));
    assert!(dir_is_empty(dir.path()));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn given_dropped_response_when_generate_then_temp_file_removed() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(ScriptedClient::replying(DOCUMENT_REPLY)), dir.path());

    let response = app
        .oneshot(post_json("/generate-docx", json!({ "topic": "T" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    drop(response);
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn given_non_json_reply_when_generate_then_server_error_text() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(
        Arc::new(ScriptedClient::replying("Sorry, here is an essay instead.")),
        dir.path(),
    );

    let response = app
        .oneshot(post_json("/generate-docx", json!({ "topic": "T" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(response).await, b"Invalid JSON from model");
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn given_reply_without_conclusion_when_generate_then_incomplete_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(
        Arc::new(ScriptedClient::replying(
            r#"{"title": "T", "outline": ["A"], "paragraphs": {}}"#,
        )),
        dir.path(),
    );

    let response = app
        .oneshot(post_json("/generate-docx", json!({ "topic": "T" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(response).await, b"Model returned incomplete JSON");
}

#[tokio::test]
async fn given_model_failure_when_generate_then_generic_error_text() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(ScriptedClient::failing("timeout")), dir.path());

    let response = app
        .oneshot(post_json("/generate-docx", json!({ "topic": "T" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(response).await, b"Error generating document");
}

// ── Static files ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn given_static_dir_when_unknown_path_then_file_served() {
    let public = tempfile::tempdir().unwrap();
    std::fs::write(public.path().join("index.html"), "<h1>hi</h1>").unwrap();
    let out = tempfile::tempdir().unwrap();

    let config = GenerationConfig::builder()
        .output_dir(out.path())
        .build()
        .unwrap();
    let server = ServerConfig {
        static_dir: Some(public.path().to_path_buf()),
        ..ServerConfig::default()
    };
    let app = create_router(
        AppState::new(Arc::new(ScriptedClient::replying("{}")), config),
        &server,
    );

    let response = app
        .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"<h1>hi</h1>");
}
