//! Route handlers.
//!
//! `/ai` and `/ai/transliterate` answer with JSON, including the
//! `{ message, raw }` payload for a reply that is not JSON. `/generate-docx`
//! answers with a DOCX attachment, or a plain-text 500 naming what went wrong.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::DocGenError;
use crate::generate::{analyze, generate_document, transliterate};
use crate::output::DecodedReply;
use crate::pipeline::emit;
use crate::prompts::excerpt;
use crate::server::download::attachment_response;
use crate::server::AppState;

const EMPTY_TEXT_MESSAGE: &str = "Please provide some input text.";
const SERVER_ERROR_MESSAGE: &str = "Server error!";
const TOPIC_REQUIRED_MESSAGE: &str = "Topic is required";
const INVALID_JSON_TEXT: &str = "Invalid JSON from model";
const INCOMPLETE_JSON_TEXT: &str = "Model returned incomplete JSON";
const GENERATION_FAILED_TEXT: &str = "Error generating document";

/// Body of `/ai` and `/ai/transliterate`. A missing `text` is treated as
/// empty.
#[derive(Debug, Default, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Body of `/generate-docx`. A missing `topic` is treated as empty.
#[derive(Debug, Default, Deserialize)]
pub struct TopicRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "ok": true })))
}

#[tracing::instrument(skip_all)]
pub async fn analyze_handler(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let text = text_field(payload);
    json_flow_response(analyze(&text, state.client.as_ref()).await)
}

#[tracing::instrument(skip_all)]
pub async fn transliterate_handler(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let text = text_field(payload);
    json_flow_response(transliterate(&text, state.client.as_ref()).await)
}

#[tracing::instrument(skip_all)]
pub async fn generate_docx_handler(
    State(state): State<AppState>,
    payload: Result<Json<TopicRequest>, JsonRejection>,
) -> Response {
    let topic = match payload {
        Ok(Json(req)) => req.topic.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable request body");
            String::new()
        }
    };
    if topic.trim().is_empty() {
        return topic_required();
    }
    tracing::info!(topic = %excerpt(&topic), "Document requested");

    let doc = match generate_document(&topic, state.client.as_ref(), &state.config).await {
        Ok(doc) => doc,
        Err(e) => return document_error_response(e),
    };

    match emit::emit(&doc.bytes, &state.config.output_dir, &topic).await {
        Ok(emitted) => attachment_response(emitted),
        Err(e) => document_error_response(e),
    }
}

fn text_field(payload: Result<Json<TextRequest>, JsonRejection>) -> String {
    match payload {
        Ok(Json(req)) => req.text.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable request body");
            String::new()
        }
    }
}

/// Analysis/transliteration contract: a malformed reply is still a 200.
fn json_flow_response(result: Result<DecodedReply, DocGenError>) -> Response {
    match result {
        Ok(decoded) => {
            if decoded.is_malformed() {
                tracing::warn!("Returning malformed model reply to caller");
            }
            (StatusCode::OK, Json(decoded.into_json())).into_response()
        }
        Err(e) if e.is_client_error() => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": EMPTY_TEXT_MESSAGE })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Model request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": SERVER_ERROR_MESSAGE })),
            )
                .into_response()
        }
    }
}

/// Document contract: every failure after validation is a plain-text 500.
fn document_error_response(e: DocGenError) -> Response {
    let text = match &e {
        DocGenError::EmptyInput { .. } => return topic_required(),
        DocGenError::MalformedReply { raw } => {
            tracing::error!(chars = raw.len(), raw = %excerpt(raw), "Invalid JSON from model");
            INVALID_JSON_TEXT
        }
        DocGenError::IncompleteDocument { missing } => {
            tracing::error!(missing = ?missing, "Model returned incomplete JSON");
            INCOMPLETE_JSON_TEXT
        }
        other => {
            tracing::error!(error = %other, "Error generating DOCX");
            GENERATION_FAILED_TEXT
        }
    };
    (StatusCode::INTERNAL_SERVER_ERROR, text).into_response()
}

fn topic_required() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": TOPIC_REQUIRED_MESSAGE })),
    )
        .into_response()
}
