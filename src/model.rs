//! Text-generation seam.
//!
//! Flows talk to the model through [`ModelClient`], one prompt in and one
//! reply out. [`ProviderClient`] is the production implementation over an
//! edgequake-llm provider; tests substitute a scripted client.

use crate::config::{GenerationConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
use crate::error::DocGenError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Sends one prompt and returns the model's raw text reply.
///
/// Implementations must not retry: a failed call is reported once and the
/// flow that made it fails.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, DocGenError>;

    /// Short description for logs, e.g. `gemini/gemini-2.5-flash`.
    fn label(&self) -> String {
        "model".to_string()
    }
}

/// [`ModelClient`] backed by an edgequake-llm [`LLMProvider`].
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    label: String,
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl ProviderClient {
    /// Wrap an already constructed provider. `label` only appears in logs.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        config: &GenerationConfig,
        label: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            options: build_options(config),
            label: label.into(),
        }
    }

    /// Resolve the provider, from most-specific to least-specific:
    ///
    /// 1. `config.provider`, used as-is
    /// 2. `config.provider_name` with `config.model` (or [`DEFAULT_MODEL`])
    /// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
    /// 4. `GEMINI_API_KEY` present: [`DEFAULT_PROVIDER`] with `config.model`
    ///    or [`DEFAULT_MODEL`]
    /// 5. [`ProviderFactory::from_env`] auto-detection
    pub fn from_config(config: &GenerationConfig) -> Result<Self, DocGenError> {
        let (provider, label) = resolve_provider(config)?;
        let client = Self::new(provider, config, label);
        debug!("Using model client {}", client.label);
        Ok(client)
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    async fn generate(&self, prompt: &str) -> Result<String, DocGenError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];

        match self.provider.chat(&messages, Some(&self.options)).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    self.label,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(response.content)
            }
            Err(e) => {
                warn!("{}: request failed after {:?}: {}", self.label, start.elapsed(), e);
                Err(DocGenError::LlmApiError {
                    message: e.to_string(),
                })
            }
        }
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

type Resolved = (Arc<dyn LLMProvider>, String);

fn create_provider(provider_name: &str, model: &str) -> Result<Resolved, DocGenError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DocGenError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok((provider, format!("{provider_name}/{model}")))
}

fn resolve_provider(config: &GenerationConfig) -> Result<Resolved, DocGenError> {
    if let Some(ref provider) = config.provider {
        let label = config.provider_name.as_deref().unwrap_or("custom");
        return Ok((Arc::clone(provider), label.to_string()));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(DEFAULT_PROVIDER, model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DocGenError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, or TOPIC2DOCX_PROVIDER with the matching API key.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "auto".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_leave_unset_values_to_the_provider() {
        let opts = build_options(&GenerationConfig::default());
        assert_eq!(opts.temperature, None);
        assert_eq!(opts.max_tokens, None);
    }

    #[test]
    fn options_carry_configured_values() {
        let config = GenerationConfig::builder()
            .temperature(0.2)
            .max_tokens(8192)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    struct Fixed;

    #[async_trait]
    impl ModelClient for Fixed {
        async fn generate(&self, prompt: &str) -> Result<String, DocGenError> {
            Ok(format!("echo: {prompt}"))
        }
    }

    #[tokio::test]
    async fn trait_object_dispatch_and_default_label() {
        let client: Arc<dyn ModelClient> = Arc::new(Fixed);
        assert_eq!(client.generate("hi").await.unwrap(), "echo: hi");
        assert_eq!(client.label(), "model");
    }
}
