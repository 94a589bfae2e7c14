//! Document data model: the decoded [`DocumentSpec`] and the
//! [`ComposedDocument`] tree the renderer consumes.
//!
//! Model replies are only loosely typed. `paragraphs` arrives either as an
//! array of single-key maps or as one map keyed by outline text, and scalars
//! occasionally show up where strings were asked for. All of that is resolved
//! here, once, so the composer only ever sees one shape.

use crate::error::DocGenError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Fields that must be present and non-empty in a document reply, in the
/// order they are reported when missing.
pub const REQUIRED_FIELDS: [&str; 3] = ["title", "outline", "conclusion"];

/// A validated document description decoded from a model reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSpec {
    pub title: String,
    pub outline: Vec<String>,
    pub paragraphs: Paragraphs,
    pub conclusion: String,
    pub references: Vec<String>,
}

impl DocumentSpec {
    /// Validate and convert a parsed reply.
    ///
    /// # Errors
    /// [`DocGenError::IncompleteDocument`] listing every required field that
    /// is absent, `null`, blank, `[]`, `false` or `0`. A reply that is not a
    /// JSON object is missing all of them.
    pub fn from_value(value: Value) -> Result<Self, DocGenError> {
        let Value::Object(obj) = value else {
            return Err(DocGenError::IncompleteDocument {
                missing: REQUIRED_FIELDS.to_vec(),
            });
        };

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|field| !obj.get(*field).is_some_and(is_present))
            .collect();
        if !missing.is_empty() {
            return Err(DocGenError::IncompleteDocument { missing });
        }

        Ok(Self {
            title: value_text(&obj["title"]),
            outline: text_list(obj.get("outline")),
            paragraphs: Paragraphs::from_value(obj.get("paragraphs")),
            conclusion: value_text(&obj["conclusion"]),
            references: text_list(obj.get("references")),
        })
    }
}

/// Body paragraphs per outline point, in whichever shape the model chose.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paragraphs {
    /// `[{ "point": ["p1", "p2"] }, …]`
    Entries(Vec<Map<String, Value>>),
    /// `{ "point": ["p1", "p2"], … }`
    Keyed(Map<String, Value>),
}

impl Default for Paragraphs {
    fn default() -> Self {
        Paragraphs::Keyed(Map::new())
    }
}

impl Paragraphs {
    /// Pick the variant from the JSON type. Anything that is neither an array
    /// nor an object (including a missing field) means "no paragraphs".
    /// Non-object array items are dropped.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => Paragraphs::Entries(
                items
                    .iter()
                    .filter_map(|item| item.as_object().cloned())
                    .collect(),
            ),
            Some(Value::Object(map)) => Paragraphs::Keyed(map.clone()),
            _ => Paragraphs::default(),
        }
    }

    /// Paragraph texts for `point`, matched by exact key.
    ///
    /// Both shapes only accept a truthy value: `Entries` uses the first map
    /// whose value for `point` is truthy, `Keyed` its entry if truthy. A
    /// non-list value becomes a one-element list; no match gives an empty list.
    pub fn for_point(&self, point: &str) -> Vec<String> {
        let found = match self {
            Paragraphs::Entries(entries) => entries
                .iter()
                .filter_map(|entry| entry.get(point))
                .find(|v| is_truthy(v)),
            Paragraphs::Keyed(map) => map.get(point).filter(|v| is_truthy(v)),
        };

        match found {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(value_text).collect(),
            Some(other) => vec![value_text(other)],
        }
    }
}

// ── Composed tree ────────────────────────────────────────────────────────

/// Paragraph role, mapped to a named style by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HeadingLevel {
    #[default]
    None,
    Title,
    Heading,
}

/// Horizontal alignment of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    End,
    Justified,
}

/// One paragraph node with its layout directives.
///
/// Lengths use DOCX units: indentation and spacing in twips (1/20 pt), font
/// size in half-points.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Block {
    pub text: String,
    pub heading: HeadingLevel,
    pub alignment: Alignment,
    pub style: Option<String>,
    pub first_line_indent: Option<i32>,
    pub spacing_before: Option<u32>,
    pub font_size: Option<usize>,
}

impl Block {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// An empty spacer paragraph.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn heading(mut self, level: HeadingLevel) -> Self {
        self.heading = level;
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn first_line_indent(mut self, twips: i32) -> Self {
        self.first_line_indent = Some(twips);
        self
    }

    pub fn spacing_before(mut self, twips: u32) -> Self {
        self.spacing_before = Some(twips);
        self
    }

    pub fn font_size(mut self, half_points: usize) -> Self {
        self.font_size = Some(half_points);
        self
    }
}

/// A run of blocks, optionally starting on a new page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Section {
    pub page_break_before: bool,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            page_break_before: false,
            blocks,
        }
    }

    /// Text of the first block, which is the section heading for every
    /// section except the cover.
    pub fn heading_text(&self) -> Option<&str> {
        self.blocks.first().map(|b| b.text.as_str())
    }
}

/// The full section tree for one document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ComposedDocument {
    pub sections: Vec<Section>,
}

impl ComposedDocument {
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }
}

// ── JSON helpers ─────────────────────────────────────────────────────────

/// Required-field presence: not null, not blank, not an empty array, not
/// `false` or `0`.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.trim().is_empty(),
        other => is_truthy(other),
    }
}

/// JavaScript-style truthiness, used for paragraph lookups.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings as-is, `null` as empty, everything else as its JSON text.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(value_text).collect(),
        Some(other) => vec![value_text(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> Result<DocumentSpec, DocGenError> {
        DocumentSpec::from_value(value)
    }

    #[test]
    fn complete_reply_converts() {
        let s = spec(json!({
            "title": "T",
            "outline": ["A", "B"],
            "paragraphs": [{"A": ["p1"]}],
            "conclusion": "C",
            "references": ["r1", "r2"]
        }))
        .unwrap();
        assert_eq!(s.title, "T");
        assert_eq!(s.outline, vec!["A", "B"]);
        assert_eq!(s.references.len(), 2);
        assert!(matches!(s.paragraphs, Paragraphs::Entries(_)));
    }

    #[test]
    fn missing_conclusion_is_rejected() {
        let err = spec(json!({"title": "T", "outline": ["A"]})).unwrap_err();
        match err {
            DocGenError::IncompleteDocument { missing } => assert_eq!(missing, vec!["conclusion"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn every_missing_field_is_reported_in_order() {
        let err = spec(json!({"title": "", "outline": [], "conclusion": null})).unwrap_err();
        match err {
            DocGenError::IncompleteDocument { missing } => {
                assert_eq!(missing, vec!["title", "outline", "conclusion"])
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_object_reply_misses_everything() {
        let err = spec(json!(["title", "outline"])).unwrap_err();
        assert!(matches!(
            err,
            DocGenError::IncompleteDocument { ref missing } if missing.len() == 3
        ));
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let s = spec(json!({"title": "T", "outline": ["A"], "conclusion": "C"})).unwrap();
        assert!(s.references.is_empty());
        assert!(s.paragraphs.for_point("A").is_empty());
    }

    #[test]
    fn scalars_are_stringified() {
        let s = spec(json!({"title": 2024, "outline": ["A", 7], "conclusion": "C"})).unwrap();
        assert_eq!(s.title, "2024");
        assert_eq!(s.outline, vec!["A", "7"]);
    }

    #[test]
    fn entries_lookup_uses_first_truthy_match() {
        let p = Paragraphs::from_value(Some(&json!([
            {"A": ""},
            {"B": ["b1"]},
            {"A": ["a1", "a2"]}
        ])));
        assert_eq!(p.for_point("A"), vec!["a1", "a2"]);
        assert_eq!(p.for_point("B"), vec!["b1"]);
        assert!(p.for_point("C").is_empty());
    }

    #[test]
    fn keyed_lookup_is_exact_match() {
        let p = Paragraphs::from_value(Some(&json!({"Intro": ["x"]})));
        assert_eq!(p.for_point("Intro"), vec!["x"]);
        assert!(p.for_point("intro").is_empty());
    }

    #[test]
    fn keyed_and_entries_skip_falsy_values_alike() {
        let keyed = Paragraphs::from_value(Some(&json!({"A": "", "B": 0, "C": null, "D": []})));
        let entries = Paragraphs::from_value(Some(&json!([
            {"A": ""}, {"B": 0}, {"C": null}, {"D": []}
        ])));
        for point in ["A", "B", "C", "D"] {
            assert!(keyed.for_point(point).is_empty(), "keyed {point}");
            assert!(entries.for_point(point).is_empty(), "entries {point}");
        }
    }

    #[test]
    fn single_value_is_coerced_to_list() {
        let p = Paragraphs::from_value(Some(&json!({"A": "only one", "B": 42})));
        assert_eq!(p.for_point("A"), vec!["only one"]);
        assert_eq!(p.for_point("B"), vec!["42"]);
    }

    #[test]
    fn unexpected_paragraph_shape_means_none() {
        let p = Paragraphs::from_value(Some(&json!("free text")));
        assert_eq!(p, Paragraphs::default());
    }

    #[test]
    fn block_builder_sets_directives() {
        let b = Block::text("x")
            .heading(HeadingLevel::Heading)
            .align(Alignment::Center)
            .first_line_indent(720)
            .spacing_before(360)
            .font_size(28);
        assert_eq!(b.heading, HeadingLevel::Heading);
        assert_eq!(b.alignment, Alignment::Center);
        assert_eq!(b.first_line_indent, Some(720));
        assert_eq!(b.spacing_before, Some(360));
        assert_eq!(b.font_size, Some(28));
        assert_eq!(Block::blank().text, "");
    }
}
