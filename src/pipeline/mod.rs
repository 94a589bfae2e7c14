//! Pipeline stages from model reply to downloadable DOCX.
//!
//! Each submodule implements exactly one transformation step and is
//! testable on its own; none of them talks to the model.
//!
//! ## Data Flow
//!
//! ```text
//! sanitize ──▶ decode ──▶ compose ──▶ render ──▶ emit
//! (raw text)  (JSON)    (sections)  (DOCX)    (temp file + stream)
//! ```
//!
//! 1. [`sanitize`] — strip fences, emphasis and stray newlines from the reply
//! 2. [`decode`]   — parse JSON; validate required document fields
//! 3. [`compose`]  — build the section tree (cover, outline, bodies,
//!    conclusion, references)
//! 4. [`render`]   — serialise the tree to DOCX bytes
//! 5. [`emit`]     — write to a temporary file and stream it back out, deleting
//!    the file afterwards

pub mod compose;
pub mod decode;
pub mod emit;
pub mod render;
pub mod sanitize;
