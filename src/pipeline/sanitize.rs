//! Reply sanitisation: turn a raw model reply into text that should parse as
//! JSON.
//!
//! Models are told to answer in pure JSON, yet they routinely wrap the answer
//! in a ```` ```json ```` fence, sprinkle `**bold**` markers into string values,
//! or emit literal `\n` escapes and hard line breaks inside strings (the
//! latter makes the JSON invalid). The rules below remove exactly those
//! artefacts. They are order-sensitive: fences go first so the emphasis rule
//! never sees backticks, and newline handling runs before whitespace collapse
//! so the spaces it introduces are folded too.
//!
//! The output is *expected* to be JSON; nothing here guarantees it. The
//! decoder deals with whatever survives.

use once_cell::sync::Lazy;
use regex::Regex;

/// Which flow the reply belongs to.
///
/// Only the document flow strips emphasis markers: analysis notes may
/// legitimately contain asterisks (e.g. "2 * 150 kg").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeProfile {
    Analysis,
    Document,
}

/// Apply every sanitisation rule for `profile`, in order:
///
/// 1. Remove all ```` ```json ```` and ```` ``` ```` markers
/// 2. *(document only)* `**text**` → `text`, then `*text*` → `text`
/// 3. Literal `\n` escapes and real line breaks → one space
/// 4. Collapse whitespace runs to a single space
/// 5. Trim
pub fn sanitize_reply(raw: &str, profile: SanitizeProfile) -> String {
    let s = strip_fences(raw);
    let s = match profile {
        SanitizeProfile::Document => strip_emphasis(&s),
        SanitizeProfile::Analysis => s,
    };
    let s = flatten_newlines(&s);
    let s = collapse_whitespace(&s);
    s.trim().to_string()
}

// ── Rule 1: Fences ───────────────────────────────────────────────────────────

fn strip_fences(input: &str) -> String {
    input.replace("```json", "").replace("```", "")
}

// ── Rule 2: Emphasis ─────────────────────────────────────────────────────────

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());

fn strip_emphasis(input: &str) -> String {
    let s = RE_BOLD.replace_all(input, "$1");
    RE_ITALIC.replace_all(&s, "$1").to_string()
}

// ── Rule 3: Newlines ─────────────────────────────────────────────────────────

fn flatten_newlines(input: &str) -> String {
    input.replace("\\n", " ").replace(['\r', '\n'], " ")
}

// ── Rule 4: Whitespace ───────────────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────
