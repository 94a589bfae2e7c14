//! Flow entry points: analysis, transliteration and document generation.
//!
//! Every flow has the same front half (`prompt → model → sanitize → decode`)
//! and differs only in what it does with the decoded reply. The model is
//! called exactly once per flow; any failure ends the flow.

use crate::config::GenerationConfig;
use crate::document::DocumentSpec;
use crate::error::DocGenError;
use crate::model::ModelClient;
use crate::output::{DecodedReply, GeneratedDocument};
use crate::pipeline::sanitize::{sanitize_reply, SanitizeProfile};
use crate::pipeline::{compose, decode, render};
use crate::progress::Stage;
use crate::prompts::{self, excerpt};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Input file of the batch transliteration flow, relative to the working
/// directory.
pub const DEFAULT_TRANSLITERATE_INPUT: &str = "file/fileText.txt";

/// Output file of the batch transliteration flow.
pub const DEFAULT_TRANSLITERATE_OUTPUT: &str = "file/fileLotin.txt";

/// Run the production-planning analysis for `text`.
///
/// A reply that is not JSON is returned as [`DecodedReply::Malformed`], not
/// as an error.
///
/// # Errors
/// * [`DocGenError::EmptyInput`] — `text` is blank; the model is not called
/// * [`DocGenError::LlmApiError`] — the model call failed
pub async fn analyze(text: &str, client: &dyn ModelClient) -> Result<DecodedReply, DocGenError> {
    require_text(text, "text")?;
    info!("Analysing input: {}", excerpt(text));

    let raw = client.generate(&prompts::analysis_prompt(text)).await?;
    let decoded = decode::decode_reply(&sanitize_reply(&raw, SanitizeProfile::Analysis));
    debug!("Analysis reply malformed: {}", decoded.is_malformed());
    Ok(decoded)
}

/// Transliterate Cyrillic `text` to Latin script.
///
/// Same contract as [`analyze`]; a well-formed reply looks like
/// `{ "data": "..." }`.
pub async fn transliterate(
    text: &str,
    client: &dyn ModelClient,
) -> Result<DecodedReply, DocGenError> {
    require_text(text, "text")?;
    info!("Transliterating input: {}", excerpt(text));

    let raw = client.generate(&prompts::transliteration_prompt(text)).await?;
    Ok(decode::decode_reply(&sanitize_reply(
        &raw,
        SanitizeProfile::Analysis,
    )))
}

/// Batch transliteration: read `input`, ask the model, write the reply to
/// `output` exactly as received.
///
/// The input is sent as-is, even when blank. Returns the number of bytes
/// written.
///
/// # Errors
/// * [`DocGenError::InputReadFailed`] — `input` cannot be read
/// * [`DocGenError::LlmApiError`] — the model call failed
/// * [`DocGenError::OutputWriteFailed`] — `output` cannot be written
pub async fn transliterate_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    client: &dyn ModelClient,
) -> Result<usize, DocGenError> {
    let input = input.as_ref();
    let output = output.as_ref();

    let text = tokio::fs::read_to_string(input)
        .await
        .map_err(|e| DocGenError::InputReadFailed {
            path: input.to_path_buf(),
            source: e,
        })?;
    info!("Read {} ({} bytes)", input.display(), text.len());

    let raw = client.generate(&prompts::transliteration_prompt(&text)).await?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DocGenError::OutputWriteFailed {
                path: output.to_path_buf(),
                source: e,
            })?;
    }
    tokio::fs::write(output, &raw)
        .await
        .map_err(|e| DocGenError::OutputWriteFailed {
            path: output.to_path_buf(),
            source: e,
        })?;

    info!("Wrote {} ({} bytes)", output.display(), raw.len());
    Ok(raw.len())
}

/// Generate a DOCX document about `topic`.
///
/// # Errors
/// * [`DocGenError::EmptyInput`] — `topic` is blank; the model is not called
/// * [`DocGenError::LlmApiError`] — the model call failed
/// * [`DocGenError::MalformedReply`] — the reply is not JSON
/// * [`DocGenError::IncompleteDocument`] — required fields are missing
/// * [`DocGenError::RenderFailed`] — DOCX packing failed
pub async fn generate_document(
    topic: &str,
    client: &dyn ModelClient,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    let total_start = Instant::now();
    require_text(topic, "topic")?;
    info!("Generating document for topic: {}", excerpt(topic));

    // ── Step 1: Ask the model ────────────────────────────────────────────
    let model_start = Instant::now();
    let raw = run_stage(config, Stage::AwaitingModel, async {
        client.generate(&prompts::document_prompt(topic, config)).await
    })
    .await?;
    let model_duration_ms = model_start.elapsed().as_millis() as u64;
    info!(
        "{} replied with {} chars in {}ms",
        client.label(),
        raw.len(),
        model_duration_ms
    );

    // ── Step 2: Sanitize + decode ────────────────────────────────────────
    let spec = run_stage(config, Stage::Decoding, async {
        decode::decode_document(&sanitize_reply(&raw, SanitizeProfile::Document))
    })
    .await?;

    // ── Step 3: Compose + render ─────────────────────────────────────────
    let bytes = compose_and_render(&spec, config).await?;

    let total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Generated '{}' ({} outline points, {} bytes) in {}ms",
        spec.title,
        spec.outline.len(),
        bytes.len(),
        total_duration_ms
    );

    Ok(GeneratedDocument {
        spec,
        bytes,
        model_duration_ms,
        total_duration_ms,
    })
}

/// Generate a document and write it to `output_path`.
///
/// The write is atomic: bytes go to a sibling `.docx.tmp` file that is then
/// renamed over the target.
pub async fn generate_document_to_file(
    topic: &str,
    output_path: impl AsRef<Path>,
    client: &dyn ModelClient,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    let doc = generate_document(topic, client, config).await?;
    write_atomic(output_path.as_ref(), &doc.bytes).await?;
    Ok(doc)
}

/// Compose and render a saved document reply without calling the model.
///
/// `reply` goes through the same sanitisation and validation as a live
/// reply, so fenced or emphasised text is accepted.
pub async fn render_saved_reply(
    reply: &str,
    config: &GenerationConfig,
) -> Result<(DocumentSpec, Vec<u8>), DocGenError> {
    let spec = run_stage(config, Stage::Decoding, async {
        decode::decode_document(&sanitize_reply(reply, SanitizeProfile::Document))
    })
    .await?;
    let bytes = compose_and_render(&spec, config).await?;
    Ok((spec, bytes))
}

/// Write `bytes` to `path` via a temporary sibling and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DocGenError> {
    let write_err = |e: std::io::Error| DocGenError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

async fn compose_and_render(
    spec: &DocumentSpec,
    config: &GenerationConfig,
) -> Result<Vec<u8>, DocGenError> {
    let composed = run_stage(config, Stage::Composing, async {
        Ok(compose::compose(spec, config))
    })
    .await?;
    debug!(
        "Composed {} sections, {} blocks",
        composed.sections.len(),
        composed.block_count()
    );

    run_stage(config, Stage::Rendering, async {
        render::render_docx(&composed)
    })
    .await
}

/// Run one stage, reporting start/complete/failure to the progress callback
/// and logging a failure once.
async fn run_stage<T>(
    config: &GenerationConfig,
    stage: Stage,
    fut: impl std::future::Future<Output = Result<T, DocGenError>>,
) -> Result<T, DocGenError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }

    match fut.await {
        Ok(value) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_complete(stage);
            }
            Ok(value)
        }
        Err(e) => {
            error!("{} failed: {}", stage, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_failure(stage, &e.to_string());
            }
            Err(e)
        }
    }
}

fn require_text(value: &str, field: &'static str) -> Result<(), DocGenError> {
    if value.trim().is_empty() {
        return Err(DocGenError::EmptyInput { field });
    }
    Ok(())
}
