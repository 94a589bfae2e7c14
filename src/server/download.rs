//! DOCX attachment responses.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::pipeline::emit::{content_disposition, EmittedDocument};
use crate::pipeline::render::DOCX_CONTENT_TYPE;

/// Stream `doc` as a DOCX attachment.
///
/// The body owns the temporary file: it is removed once the transfer
/// finishes, or when the body is dropped because the client went away.
pub fn attachment_response(doc: EmittedDocument) -> Response {
    let disposition = content_disposition(doc.file_name());
    let len = doc.len();
    tracing::info!(file = %doc.file_name(), bytes = len, "Sending document");

    let built = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, DOCX_CONTENT_TYPE)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, len)
        .body(Body::from_stream(doc.into_stream()));

    match built {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Download error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error generating document").into_response()
        }
    }
}
