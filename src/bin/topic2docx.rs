//! CLI binary for topic2docx.
//!
//! A thin shim over the library crate: maps flags to `GenerationConfig`,
//! runs one flow (or the HTTP server) and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use topic2docx::generate::{write_atomic, DEFAULT_TRANSLITERATE_INPUT, DEFAULT_TRANSLITERATE_OUTPUT};
use topic2docx::pipeline::emit::file_stem;
use topic2docx::server::{self, AppState};
use topic2docx::{
    analyze, generate_document_to_file, render_saved_reply, transliterate_file, AnalysisResult,
    CoverPage, DecodedReply, GenerationConfig, GenerationProgressCallback, ModelClient,
    ProgressCallback, ProviderClient, ServerConfig, Stage,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that shows the running stage and logs a line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    failed: AtomicBool,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("topic2docx");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failed: AtomicBool::new(false),
        })
    }

    /// Clear the spinner; after a failure, leave the last line visible.
    fn finish(&self) {
        if self.failed.load(Ordering::SeqCst) {
            self.bar.abandon_with_message("failed");
        } else {
            self.bar.finish_and_clear();
        }
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{}…", stage.label()));
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.bar
            .println(format!("  {} {}", green("✓"), dim(stage.label())));
    }

    fn on_failure(&self, stage: Stage, error: &str) {
        self.failed.store(true, Ordering::SeqCst);
        self.bar
            .println(format!("  {} {}: {}", red("✘"), stage.label(), error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a document (writes Quyosh_energiyasi.docx)
  topic2docx generate "Quyosh energiyasi"

  # Generate in English with a cover page
  topic2docx --language English --cover-page generate "Graph theory" -o graph.docx

  # Analyse a production plan
  topic2docx analyze "200 kg apples, 100 kg sugar; 1 jar of jam = 0.5 kg apples + 0.2 kg sugar"

  # Re-render a saved model reply without calling the model
  topic2docx render reply.json -o doc.docx

  # Transliterate file/fileText.txt into file/fileLotin.txt
  topic2docx transliterate

  # Run the HTTP server on port 8080
  topic2docx serve --port 8080

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  TOPIC2DOCX_PROVIDER     Provider name (gemini, openai, anthropic, ollama, …)
  TOPIC2DOCX_MODEL        Model ID (default: gemini-2.5-flash)
  TOPIC2DOCX_LANGUAGE     Document language (default: Uzbek)
  TOPIC2DOCX_COVER_PAGE   Render the static cover page
  TOPIC2DOCX_OUTPUT_DIR   Directory for temporary DOCX files (server)
  TOPIC2DOCX_STATIC_DIR   Static file directory for `serve` ("none" disables)
  PORT                    Port for `serve` (default: 3000)
  LOG_FORMAT              "json" for JSON log lines
  RUST_LOG                Overrides the log filter

A `.env` file in the working directory is loaded before flags are parsed.
"#;

/// Generate model-written DOCX documents and JSON analyses.
#[derive(Parser, Debug)]
#[command(
    name = "topic2docx",
    version,
    about = "Generate model-written DOCX documents and JSON analyses",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// LLM provider: gemini, openai, anthropic, ollama, …
    #[arg(long, global = true, env = "TOPIC2DOCX_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (default: gemini-2.5-flash).
    #[arg(long, global = true, env = "TOPIC2DOCX_MODEL")]
    model: Option<String>,

    /// Language the document is written in.
    #[arg(long, global = true, env = "TOPIC2DOCX_LANGUAGE", default_value = "Uzbek")]
    language: String,

    /// Render the static cover page before the title.
    #[arg(long, global = true, env = "TOPIC2DOCX_COVER_PAGE")]
    cover_page: bool,

    /// Directory for temporary DOCX files.
    #[arg(long, global = true, env = "TOPIC2DOCX_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// LLM temperature (0.0–2.0). Provider default when unset.
    #[arg(long, global = true, env = "TOPIC2DOCX_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max reply tokens. Provider default when unset.
    #[arg(long, global = true, env = "TOPIC2DOCX_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "TOPIC2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "TOPIC2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "TOPIC2DOCX_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Port to listen on.
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Directory served for unmatched routes ("none" disables).
        #[arg(long, env = "TOPIC2DOCX_STATIC_DIR")]
        static_dir: Option<String>,
    },

    /// Production-planning analysis of free-form text; prints JSON.
    Analyze {
        /// Resources and recipe, in any wording.
        text: String,
    },

    /// Generate a document about TOPIC.
    Generate {
        /// Document topic.
        topic: String,

        /// Output path. Default: `<topic>.docx` with whitespace as `_`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compose and render a saved model reply (no model call).
    Render {
        /// File holding the reply JSON (fences and emphasis are tolerated).
        reply: PathBuf,

        /// Output path. Default: `<title>.docx` with whitespace as `_`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Transliterate a Cyrillic text file; the raw reply is written as-is.
    Transliterate {
        #[arg(long, default_value = DEFAULT_TRANSLITERATE_INPUT)]
        input: PathBuf,

        #[arg(long, default_value = DEFAULT_TRANSLITERATE_OUTPUT)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; a malformed one is worth knowing about.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: failed to load .env: {e}");
        }
    }

    let cli = Cli::parse();
    let serving = matches!(cli.command, Command::Serve { .. });

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters for one-shot flows,
    // so library INFO logs are suppressed while it runs.
    let show_progress = !serving && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    let server_config = if serving {
        ServerConfig::from_env().context("Invalid server configuration")?
    } else {
        ServerConfig::default()
    };
    init_tracing(filter, serving && server_config.json_logs);

    let progress: Option<Arc<CliProgressCallback>> = show_progress.then(CliProgressCallback::new);
    let config = build_config(&cli, progress.clone().map(|cb| cb as ProgressCallback))?;

    let result = run(cli.command, config, server_config, cli.quiet).await;
    if let Some(cb) = progress {
        cb.finish();
    }
    result
}

async fn run(
    command: Command,
    config: GenerationConfig,
    mut server_config: ServerConfig,
    quiet: bool,
) -> Result<()> {
    match command {
        // ── Serve ────────────────────────────────────────────────────────
        Command::Serve { port, static_dir } => {
            if let Some(port) = port {
                server_config.addr.set_port(port);
            }
            if let Some(dir) = static_dir {
                server_config.static_dir = match dir.as_str() {
                    "none" | "off" => None,
                    _ => Some(PathBuf::from(dir)),
                };
            }
            let client = model_client(&config)?;
            server::serve(AppState::new(client, config), &server_config)
                .await
                .context("Server failed")?;
        }

        // ── Analyze ──────────────────────────────────────────────────────
        Command::Analyze { text } => {
            let client = model_client(&config)?;
            let decoded = analyze(&text, client.as_ref())
                .await
                .context("Analysis failed")?;

            if !quiet {
                print_analysis_summary(&decoded);
            }
            let json = serde_json::to_string_pretty(&decoded.into_json())
                .context("Failed to serialise reply")?;
            println!("{json}");
        }

        // ── Generate ─────────────────────────────────────────────────────
        Command::Generate { topic, output } => {
            let output = output
                .unwrap_or_else(|| PathBuf::from(format!("{}.docx", file_stem(topic.trim()))));
            let client = model_client(&config)?;
            let doc = generate_document_to_file(&topic, &output, client.as_ref(), &config)
                .await
                .context("Document generation failed")?;

            if !quiet {
                eprintln!(
                    "{}  {}  {} points  {}ms  →  {}",
                    green("✔"),
                    bold(&doc.spec.title),
                    doc.spec.outline.len(),
                    doc.total_duration_ms,
                    bold(&output.display().to_string()),
                );
            }
        }

        // ── Render ───────────────────────────────────────────────────────
        Command::Render { reply, output } => {
            let text = tokio::fs::read_to_string(&reply)
                .await
                .with_context(|| format!("Failed to read reply from {:?}", reply))?;
            let (spec, bytes) = render_saved_reply(&text, &config)
                .await
                .context("Rendering failed")?;
            let output = output.unwrap_or_else(|| {
                PathBuf::from(format!("{}.docx", file_stem(spec.title.trim())))
            });
            write_atomic(&output, &bytes)
                .await
                .context("Failed to write document")?;

            if !quiet {
                eprintln!(
                    "{}  {}  {} bytes  →  {}",
                    green("✔"),
                    bold(&spec.title),
                    bytes.len(),
                    bold(&output.display().to_string()),
                );
            }
        }

        // ── Transliterate ────────────────────────────────────────────────
        Command::Transliterate { input, output } => {
            let client = model_client(&config)?;
            let written = transliterate_file(&input, &output, client.as_ref())
                .await
                .context("Transliteration failed")?;

            if !quiet {
                eprintln!(
                    "{}  {} bytes  →  {}",
                    green("✔"),
                    written,
                    bold(&output.display().to_string()),
                );
            }
        }
    }

    Ok(())
}

fn init_tracing(filter: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn model_client(config: &GenerationConfig) -> Result<Arc<dyn ModelClient>> {
    let client =
        ProviderClient::from_config(config).context("Failed to initialise the model client")?;
    Ok(Arc::new(client))
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder().language(cli.language.clone());

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if cli.cover_page {
        builder = builder.cover_page(CoverPage::default());
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_analysis_summary(decoded: &DecodedReply) {
    let value = match decoded {
        DecodedReply::Malformed(m) => {
            eprintln!("{}  {}", red("✘"), m.message);
            return;
        }
        DecodedReply::Parsed(value) => value,
    };

    let Some(analysis) = AnalysisResult::from_value(value) else {
        return;
    };
    eprintln!(
        "{}  {}: {} products, estimated profit {}",
        green("✔"),
        bold(&analysis.product_type),
        analysis.total_products,
        analysis.estimated_profit,
    );
    for (name, left) in &analysis.leftover_ingredients {
        eprintln!("   {} {}", dim(&format!("{name:<16}")), left);
    }
}
