//! Shared test doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use topic2docx::{DocGenError, ModelClient};
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Route library logs to the test harness; `RUST_LOG=topic2docx=debug` to see them.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A complete document reply, fenced and emphasised the way models send it.
pub const DOCUMENT_REPLY: &str = "```json\n{\n  \"title\": \"**Quyosh energiyasi**\",\n  \
    \"outline\": [\"Kirish\", \"Asosiy qism\"],\n  \
    \"paragraphs\": [{\"Kirish\": [\"Birinchi paragraf.\"]}, \
    {\"Asosiy qism\": [\"Ikkinchi paragraf.\", \"Uchinchi paragraf.\"]}],\n  \
    \"conclusion\": \"Xulosa matni.\",\n  \
    \"references\": [\"Ref A\", \"Ref B\"]\n}\n```";

/// Model double that returns a fixed reply and records every prompt.
pub struct ScriptedClient {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String, DocGenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .map_err(|message| DocGenError::LlmApiError { message })
    }

    fn label(&self) -> String {
        "scripted".to_string()
    }
}
