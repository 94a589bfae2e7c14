//! # topic2docx
//!
//! Turn a topic into a model-written, paginated DOCX document, or free-form
//! text into model-produced JSON.
//!
//! A generative model is asked for JSON and nearly always answers with
//! something close to it: fenced in ```` ```json ````, sprinkled with
//! `**bold**`, broken across lines. This crate cleans such replies up, parses
//! them, checks the fields a document needs, and lays the result out as a
//! Word document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! topic
//!  │
//!  ├─ 1. Prompt    structured-document instruction (language, outline size)
//!  ├─ 2. Model     one call through a ModelClient (Gemini by default)
//!  ├─ 3. Sanitize  fences, emphasis, newlines, whitespace
//!  ├─ 4. Decode    JSON parse + required fields (title, outline, conclusion)
//!  ├─ 5. Compose   cover? → outline → one section per point → conclusion → references
//!  ├─ 6. Render    DOCX bytes via docx-rs
//!  └─ 7. Emit      temp file, streamed to the client, deleted afterwards
//! ```
//!
//! The analysis and transliteration flows stop after step 4 and hand back
//! the parsed JSON, or a `{ message, raw }` payload when the reply is not JSON.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use topic2docx::{generate_document, GenerationConfig, ProviderClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / EDGEQUAKE_LLM_PROVIDER / …
//!     let config = GenerationConfig::default();
//!     let client = ProviderClient::from_config(&config)?;
//!     let doc = generate_document("Renewable energy", &client, &config).await?;
//!     std::fs::write("renewable.docx", &doc.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | The axum router in [`server`] |
//! | `cli`    | on      | The `topic2docx` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    CoverPage, GenerationConfig, GenerationConfigBuilder, SectionLabels, ServerConfig,
};
pub use document::{ComposedDocument, DocumentSpec, Paragraphs};
pub use error::DocGenError;
pub use generate::{
    analyze, generate_document, generate_document_to_file, render_saved_reply, transliterate,
    transliterate_file,
};
pub use model::{ModelClient, ProviderClient};
pub use output::{AnalysisResult, DecodedReply, GeneratedDocument, MalformedReply};
pub use pipeline::emit::EmittedDocument;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
