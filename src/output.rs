//! Result types returned by the flows in [`crate::generate`].

use crate::document::DocumentSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Message attached to a reply that could not be parsed.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON format";

/// Diagnostic payload returned in place of a reply that is not JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedReply {
    pub message: String,
    /// The sanitised reply text.
    pub raw: String,
}

impl MalformedReply {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            message: INVALID_JSON_MESSAGE.to_string(),
            raw: raw.into(),
        }
    }
}

/// Outcome of decoding an analysis or transliteration reply.
///
/// Never an error: a reply that does not parse becomes
/// [`DecodedReply::Malformed`] and is handed back to the caller as data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedReply {
    Parsed(Value),
    Malformed(MalformedReply),
}

impl DecodedReply {
    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodedReply::Malformed(_))
    }

    /// The JSON body to send back to an HTTP caller.
    pub fn into_json(self) -> Value {
        match self {
            DecodedReply::Parsed(value) => value,
            DecodedReply::Malformed(m) => serde_json::json!({
                "message": m.message,
                "raw": m.raw,
            }),
        }
    }
}

/// Typed view of an analysis reply.
///
/// Every field is optional on the wire; missing ones take their default so a
/// partially filled reply still produces a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    pub product_type: String,
    pub total_products: f64,
    pub estimated_profit: f64,
    pub used_ingredients: BTreeMap<String, f64>,
    pub leftover_ingredients: BTreeMap<String, f64>,
    pub notes: String,
}

impl AnalysisResult {
    /// Interpret a parsed reply. Returns None when field types don't fit
    /// (e.g. `totalProducts` is a string).
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// A rendered document, ready to be written or streamed.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// The decoded reply the document was composed from.
    pub spec: DocumentSpec,
    /// DOCX bytes.
    pub bytes: Vec<u8>,
    /// Wall-clock time spent waiting for the model.
    pub model_duration_ms: u64,
    /// Wall-clock time for the whole flow.
    pub total_duration_ms: u64,
}
