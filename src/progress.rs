//! Progress-callback trait for generation-stage events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to be told
//! when each stage of a flow starts and finishes. The CLI uses it to drive a
//! spinner while the model is thinking; a server could forward the same events
//! to its own telemetry.
//!
//! # Example
//!
//! ```rust
//! use topic2docx::{GenerationConfig, GenerationProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{} …", stage.label());
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The observable stages of a generation flow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Prompt sent, waiting for the model reply.
    AwaitingModel,
    /// Sanitising and decoding the reply.
    Decoding,
    /// Mapping the decoded document into sections.
    Composing,
    /// Packing the composed document into DOCX bytes.
    Rendering,
}

impl Stage {
    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::AwaitingModel => "Waiting for model",
            Stage::Decoding => "Decoding reply",
            Stage::Composing => "Composing document",
            Stage::Rendering => "Rendering DOCX",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the flows in [`crate::generate`] as they move through stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called when `stage` begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when `stage` finished successfully.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once when the flow fails; `stage` is the one that was running.
    fn on_failure(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
