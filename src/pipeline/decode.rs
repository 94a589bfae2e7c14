//! JSON decoding of sanitised replies.
//!
//! The two flows treat a reply that is not JSON differently, and that
//! difference is part of their HTTP contracts:
//!
//! * analysis / transliteration: [`decode_reply`] never fails, a bad reply
//!   becomes a [`DecodedReply::Malformed`] diagnostic payload;
//! * document: [`decode_document`] fails with
//!   [`DocGenError::MalformedReply`], and a parsed reply still has to pass the
//!   required-field check in [`DocumentSpec::from_value`].

use crate::document::DocumentSpec;
use crate::error::DocGenError;
use crate::output::{DecodedReply, MalformedReply};
use serde_json::Value;
use tracing::{debug, warn};

/// Parse an analysis or transliteration reply.
pub fn decode_reply(text: &str) -> DecodedReply {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => DecodedReply::Parsed(value),
        Err(e) => {
            warn!("Reply is not valid JSON ({}), returning raw text", e);
            DecodedReply::Malformed(MalformedReply::new(text))
        }
    }
}

/// Parse and validate a document reply.
///
/// # Errors
/// * [`DocGenError::MalformedReply`] — `text` is not JSON
/// * [`DocGenError::IncompleteDocument`] — `title`, `outline` or `conclusion`
///   is missing or empty
pub fn decode_document(text: &str) -> Result<DocumentSpec, DocGenError> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        warn!("Document reply is not valid JSON: {}", e);
        debug!("Raw sanitised reply: {}", text);
        DocGenError::MalformedReply {
            raw: text.to_string(),
        }
    })?;

    let spec = DocumentSpec::from_value(value).inspect_err(|e| warn!("{}", e))?;
    debug!(
        "Decoded document '{}' with {} outline points",
        spec.title,
        spec.outline.len()
    );
    Ok(spec)
}
