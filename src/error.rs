//! Error types for the topic2docx library.
//!
//! A single [`DocGenError`] covers every failure a flow can hit. The variants
//! are grouped by the class of failure because the HTTP layer maps each class
//! to a different status:
//!
//! * **Input validation** — the caller sent nothing usable
//!   ([`DocGenError::EmptyInput`]). Client error, the model is never called.
//! * **Upstream parse failure** — the model reply is not JSON even after
//!   sanitisation ([`DocGenError::MalformedReply`]).
//! * **Schema incompleteness** — the reply parsed but lacks required keys
//!   ([`DocGenError::IncompleteDocument`]).
//! * **I/O and serialisation** — rendering, writing or reading files.
//!
//! Nothing in this crate retries: every error is terminal for the request
//! that produced it.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the topic2docx library.
#[derive(Debug, Error)]
pub enum DocGenError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A required request field was missing or blank after trimming.
    #[error("'{field}' must not be empty")]
    EmptyInput { field: &'static str },

    /// An input file for the batch flow could not be read.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── Reply errors ──────────────────────────────────────────────────────
    /// The sanitised reply is not valid JSON. `raw` is kept for diagnostics.
    #[error("Model reply is not valid JSON ({} chars after sanitising)", raw.len())]
    MalformedReply { raw: String },

    /// The reply parsed but required document fields are absent or empty.
    #[error("Model reply is missing required fields: {}", missing.join(", "))]
    IncompleteDocument { missing: Vec<&'static str> },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The composed document could not be packed into a DOCX archive.
    #[error("Failed to render document: {detail}")]
    RenderFailed { detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocGenError {
    /// True for failures caused by the caller's input rather than by the
    /// model or the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DocGenError::EmptyInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_document_lists_every_field() {
        let e = DocGenError::IncompleteDocument {
            missing: vec!["title", "conclusion"],
        };
        let msg = e.to_string();
        assert!(msg.contains("title, conclusion"), "got: {msg}");
    }

    #[test]
    fn malformed_reply_display_does_not_echo_raw_text() {
        let e = DocGenError::MalformedReply {
            raw: "not json at all".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("15 chars"), "got: {msg}");
        assert!(!msg.contains("not json"));
    }

    #[test]
    fn only_empty_input_is_a_client_error() {
        assert!(DocGenError::EmptyInput { field: "topic" }.is_client_error());
        assert!(!DocGenError::MalformedReply { raw: String::new() }.is_client_error());
        assert!(!DocGenError::Internal("boom".into()).is_client_error());
    }
}
