//! Configuration types for generation flows and the HTTP server.
//!
//! Everything a flow needs is in [`GenerationConfig`], built via its
//! [`GenerationConfigBuilder`] or read from the environment with
//! [`GenerationConfig::from_env`]. The server-only knobs (bind address, static
//! directory, log format) live in [`ServerConfig`].

use crate::error::DocGenError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Provider used when nothing else is configured.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for the analysis, transliteration and document flows.
///
/// # Example
/// ```rust
/// use topic2docx::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .language("English")
///     .outline_points(3, 5)
///     .build()
///     .unwrap();
/// assert_eq!(config.outline_points, (3, 5));
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    /// If None, see [`crate::model::ProviderClient::from_config`] for the
    /// fallback chain.
    pub provider_name: Option<String>,

    /// Model identifier. If None, [`DEFAULT_MODEL`] is used with the default
    /// provider and the provider's own default otherwise.
    pub model: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. None leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Maximum tokens in the reply. None leaves the provider default in place.
    ///
    /// A document reply carries every paragraph of every outline point, so a
    /// low cap truncates the JSON mid-string and the reply fails to parse.
    pub max_tokens: Option<usize>,

    /// Language the document must be written in. Default: "Uzbek".
    pub language: String,

    /// Inclusive range of outline points to request. Default: (4, 6).
    pub outline_points: (usize, usize),

    /// Words requested per outline point. Default: 345.
    pub paragraph_words: usize,

    /// Minimum words requested for the conclusion. Default: 35.
    pub conclusion_words: usize,

    /// Static cover page rendered before the title section. Default: None.
    pub cover_page: Option<CoverPage>,

    /// Fixed section headings.
    pub labels: SectionLabels,

    /// Directory the emitter writes temporary DOCX files into.
    /// Default: the system temp directory.
    pub output_dir: PathBuf,

    /// Optional stage-event callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider_name: None,
            model: None,
            provider: None,
            temperature: None,
            max_tokens: None,
            language: "Uzbek".to_string(),
            outline_points: (4, 6),
            paragraph_words: 345,
            conclusion_words: 35,
            cover_page: None,
            labels: SectionLabels::default(),
            output_dir: std::env::temp_dir(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("language", &self.language)
            .field("outline_points", &self.outline_points)
            .field("paragraph_words", &self.paragraph_words)
            .field("conclusion_words", &self.conclusion_words)
            .field("cover_page", &self.cover_page.is_some())
            .field("labels", &self.labels)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from `TOPIC2DOCX_*` environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `TOPIC2DOCX_PROVIDER` | `provider_name` |
    /// | `TOPIC2DOCX_MODEL` | `model` |
    /// | `TOPIC2DOCX_LANGUAGE` | `language` |
    /// | `TOPIC2DOCX_COVER_PAGE` | `cover_page` (`1`/`true` enables the default cover) |
    /// | `TOPIC2DOCX_OUTPUT_DIR` | `output_dir` |
    pub fn from_env() -> Result<Self, DocGenError> {
        let mut builder = Self::builder();

        if let Some(provider) = non_empty_env("TOPIC2DOCX_PROVIDER") {
            builder = builder.provider_name(provider);
        }
        if let Some(model) = non_empty_env("TOPIC2DOCX_MODEL") {
            builder = builder.model(model);
        }
        if let Some(language) = non_empty_env("TOPIC2DOCX_LANGUAGE") {
            builder = builder.language(language);
        }
        if let Some(flag) = non_empty_env("TOPIC2DOCX_COVER_PAGE") {
            if parse_flag(&flag) {
                builder = builder.cover_page(CoverPage::default());
            }
        }
        if let Some(dir) = non_empty_env("TOPIC2DOCX_OUTPUT_DIR") {
            builder = builder.output_dir(dir);
        }

        builder.build()
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn outline_points(mut self, min: usize, max: usize) -> Self {
        self.config.outline_points = (min, max);
        self
    }

    pub fn paragraph_words(mut self, n: usize) -> Self {
        self.config.paragraph_words = n;
        self
    }

    pub fn conclusion_words(mut self, n: usize) -> Self {
        self.config.conclusion_words = n;
        self
    }

    pub fn cover_page(mut self, cover: CoverPage) -> Self {
        self.config.cover_page = Some(cover);
        self
    }

    pub fn labels(mut self, labels: SectionLabels) -> Self {
        self.config.labels = labels;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, DocGenError> {
        let c = &self.config;
        let (min, max) = c.outline_points;
        if min == 0 || min > max {
            return Err(DocGenError::InvalidConfig(format!(
                "Outline points must satisfy 1 ≤ min ≤ max, got {min}–{max}"
            )));
        }
        if c.language.trim().is_empty() {
            return Err(DocGenError::InvalidConfig(
                "Language must not be empty".into(),
            ));
        }
        if c.paragraph_words == 0 {
            return Err(DocGenError::InvalidConfig(
                "Paragraph words must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Document furniture ───────────────────────────────────────────────────

/// Static content of the optional cover page.
///
/// The cover is independent of the generated content: it carries the
/// institution header, subject, author and reviewer lines. Deployments either
/// render it for every document or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverPage {
    pub institution: String,
    pub subject: String,
    pub author: String,
    pub reviewer: String,
    pub place_and_year: String,
}

impl Default for CoverPage {
    fn default() -> Self {
        Self {
            institution: "O’ZBEKISTON RESPUBLIKASI OLIY TA’LIM, FAN VA INNOVATSIYALAR HAMDA \
                RAQAMLI TEXNOLOGIYALAR VAZIRLIGI MUHAMMAD AL-XORAZMIY NOMIDAGI TOSHKENT \
                AXBOROT TEXNOLOGIYALARI UNIVERSITETI"
                .to_string(),
            subject: "Matematik injiniring asoslari".to_string(),
            author: "Bajardi: Polvonov Azimjon".to_string(),
            reviewer: "Tekshirdi: Ravshanov Shohjaxon".to_string(),
            place_and_year: "TOSHKENT 2025".to_string(),
        }
    }
}

/// Fixed headings of the outline, conclusion and references sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLabels {
    pub outline: String,
    pub conclusion: String,
    pub references: String,
}

impl Default for SectionLabels {
    fn default() -> Self {
        Self {
            outline: "REJA".to_string(),
            conclusion: "XULOSA".to_string(),
            references: "ADABIYOTLAR".to_string(),
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind. Default: `0.0.0.0:3000`.
    pub addr: SocketAddr,
    /// Directory served as the router fallback. None disables static files.
    pub static_dir: Option<PathBuf>,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            static_dir: Some(PathBuf::from("public")),
            json_logs: false,
        }
    }
}

impl ServerConfig {
    /// Read `PORT`, `TOPIC2DOCX_STATIC_DIR` and `LOG_FORMAT`.
    ///
    /// An unparsable `PORT` is a configuration error rather than a silent
    /// fallback to 3000.
    pub fn from_env() -> Result<Self, DocGenError> {
        let mut config = Self::default();

        if let Some(port) = non_empty_env("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| DocGenError::InvalidConfig(format!("PORT is not a port: {port}")))?;
            config.addr.set_port(port);
        }
        if let Some(dir) = non_empty_env("TOPIC2DOCX_STATIC_DIR") {
            config.static_dir = match dir.as_str() {
                "none" | "off" => None,
                _ => Some(PathBuf::from(dir)),
            };
        }
        config.json_logs = non_empty_env("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(config)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
