//! CLI binary for mealscan.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalyzerConfig`, then analyses images, serves HTTP, or prints prompts.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mealscan::{
    prompts, schema, AnalysisMode, AnalysisProgressCallback, AnalysisRequest, AnalysisStore,
    Analyzer, AnalyzerConfig, FileStore, ImageTransport, ProgressCallback, RestStore, Stage,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

/// Spinner on stderr with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        let msg = match stage {
            Stage::Vision => "describing image…",
            Stage::Structuring => "structuring description…",
        };
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(msg);
    }

    fn on_stage_complete(&self, stage: Stage, elapsed: Duration, text_len: usize) {
        self.bar.println(format!(
            "{} {:<12} {}",
            green("✔"),
            stage.to_string(),
            dim(&format!("{}ms  {} chars", elapsed.as_millis(), text_len)),
        ));
    }

    fn on_analysis_complete(&self, error: Option<&str>) {
        self.bar.finish_and_clear();
        if let Some(e) = error {
            eprintln!("{} {}", red("✘"), e);
        }
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a plated dish
  mealscan analyze --mode dish https://abc.supabase.co/storage/v1/object/public/images/lunch.jpg

  # Several fridge shelves in one request
  mealscan analyze --mode fridge https://…/shelf1.jpg https://…/shelf2.jpg

  # Serve POST /api/analyze on port 8080
  mealscan serve --bind 0.0.0.0:8080

  # Print the prompts and schema for a mode (no API key needed)
  mealscan prompt --mode recipe

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY        OpenRouter API key (default model ids are OpenRouter ids)
  OPENAI_API_KEY            OpenAI API key
  EDGEQUAKE_LLM_PROVIDER    Override provider (openrouter, openai, anthropic, gemini, ollama)
  MEALSCAN_TRUSTED_DOMAINS  Comma-separated trusted image hosts (default: supabase.co)
  MEALSCAN_ENV              Set to "development" to include error details in HTTP 500 bodies
  SUPABASE_URL / SUPABASE_KEY   Store analyses in the `analyses` table
"#;

/// Extract structured food data from photos using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "mealscan",
    version,
    about = "Extract structured food data from photos using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MEALSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MEALSCAN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one or more image URLs and print the validated JSON.
    Analyze(AnalyzeArgs),
    /// Serve the HTTP API (requires the `server` feature).
    Serve(ServeArgs),
    /// Print the vision prompt and schema for a mode.
    Prompt {
        #[arg(short, long)]
        mode: AnalysisMode,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// dish, fridge or recipe.
    #[arg(short, long)]
    mode: AnalysisMode,

    /// Image URL(s). Only fridge mode uses more than the first.
    #[arg(required = true)]
    images: Vec<String>,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print timings and token usage alongside the record.
    #[arg(long)]
    stats: bool,

    /// Disable the spinner.
    #[arg(long, env = "MEALSCAN_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "MEALSCAN_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// LLM provider: openrouter, openai, anthropic, gemini, ollama.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Vision (multimodal) model ID.
    #[arg(long, env = "MEALSCAN_VISION_MODEL", default_value = mealscan::config::DEFAULT_VISION_MODEL)]
    vision_model: String,

    /// Structuring (text) model ID.
    #[arg(long, env = "MEALSCAN_STRUCTURE_MODEL", default_value = mealscan::config::DEFAULT_STRUCTURE_MODEL)]
    structure_model: String,

    /// Vision temperature (0.0–2.0). Structuring always runs at 0.
    #[arg(long, env = "MEALSCAN_VISION_TEMPERATURE", default_value_t = 0.3)]
    vision_temperature: f32,

    /// Max output tokens per model call.
    #[arg(long, env = "MEALSCAN_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Per-call timeout in seconds.
    #[arg(long, env = "MEALSCAN_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Retries on transport failure or timeout (0 = none).
    #[arg(long, env = "MEALSCAN_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Structuring repair rounds on malformed or invalid JSON (0 = none).
    #[arg(long, env = "MEALSCAN_REPAIR_ATTEMPTS", default_value_t = 0)]
    repair_attempts: u32,

    /// Trusted image hosts, comma-separated.
    #[arg(long, env = "MEALSCAN_TRUSTED_DOMAINS", value_delimiter = ',', default_value = "supabase.co")]
    trusted_domains: Vec<String>,

    /// How images reach the vision model.
    #[arg(long, env = "MEALSCAN_IMAGE_TRANSPORT", value_enum, default_value = "hosted-url")]
    image_transport: TransportArg,

    /// Largest image downloaded for inline transport, in bytes.
    #[arg(long, env = "MEALSCAN_MAX_IMAGE_BYTES", default_value_t = mealscan::config::DEFAULT_MAX_IMAGE_BYTES)]
    max_image_bytes: u64,

    /// Deployment environment; "development" exposes error details.
    #[arg(long, env = "MEALSCAN_ENV", default_value = "production")]
    env: String,

    /// Append analyses to this JSON-lines file.
    #[arg(long, env = "MEALSCAN_STORE_FILE")]
    store_file: Option<PathBuf>,

    /// PostgREST/Supabase project URL for storing analyses.
    #[arg(long, env = "SUPABASE_URL", requires = "supabase_key")]
    supabase_url: Option<String>,

    /// API key for `--supabase-url`.
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TransportArg {
    HostedUrl,
    InlineData,
}

impl From<TransportArg> for ImageTransport {
    fn from(v: TransportArg) -> Self {
        match v {
            TransportArg::HostedUrl => ImageTransport::HostedUrl,
            TransportArg::InlineData => ImageTransport::InlineData,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback during `analyze`; keep library logs
    // at error level there unless asked for more.
    let show_progress = match &cli.command {
        Command::Analyze(a) => !cli.quiet && !a.no_progress,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Analyze(args) => run_analyze(args, show_progress, cli.quiet).await,
        Command::Serve(args) => run_serve(args).await,
        Command::Prompt { mode } => {
            println!("{}", bold(&format!("── Vision prompt ({mode}) ──")));
            println!("{}\n", prompts::vision_prompt(mode));
            println!("{}", bold(&format!("── Schema ({mode}) ──")));
            println!("{}", schema::schema_description(mode));
            Ok(())
        }
    }
}

#[cfg(feature = "server")]
async fn run_serve(args: ServeArgs) -> Result<()> {
    let analyzer = build_analyzer(&args.pipeline, None)?;
    mealscan::server::serve(Arc::new(analyzer), &args.bind)
        .await
        .with_context(|| format!("Server on {} failed", args.bind))
}

#[cfg(not(feature = "server"))]
async fn run_serve(_args: ServeArgs) -> Result<()> {
    anyhow::bail!("mealscan was built without the `server` feature")
}

async fn run_analyze(args: AnalyzeArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let analyzer = build_analyzer(&args.pipeline, progress)?;

    let request = AnalysisRequest::new(args.images.iter().cloned(), args.mode);
    let output = analyzer.analyze(&request).await.context("Analysis failed")?;

    let json = if args.stats {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string_pretty(&output.analysis)
    }
    .context("Failed to serialise output")?;

    match &args.output {
        Some(path) => tokio::fs::write(path, format!("{json}\n"))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    if !quiet {
        eprintln!(
            "{}  {}  {}ms  {}",
            green("✔"),
            bold(&output.analysis.summary()),
            output.stats.total_ms,
            dim(&format!(
                "{} tokens in / {} tokens out",
                output.stats.input_tokens, output.stats.output_tokens
            )),
        );
    }
    Ok(())
}

/// Map CLI args to an `Analyzer`, attaching a store when one is configured.
fn build_analyzer(args: &PipelineArgs, progress: Option<ProgressCallback>) -> Result<Analyzer> {
    let mut builder = AnalyzerConfig::builder()
        .vision_model(&args.vision_model)
        .structure_model(&args.structure_model)
        .vision_temperature(args.vision_temperature)
        .max_tokens(args.max_tokens)
        .api_timeout_secs(args.api_timeout)
        .max_retries(args.max_retries)
        .repair_attempts(args.repair_attempts)
        .trusted_image_domains(args.trusted_domains.iter().cloned())
        .image_transport(args.image_transport.into())
        .max_image_bytes(args.max_image_bytes)
        .expose_error_details(args.env.eq_ignore_ascii_case("development"));

    if let Some(ref name) = args.provider {
        builder = builder.provider_name(name);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let config = builder.build().context("Invalid configuration")?;
    let timeout = config.api_timeout_secs;
    let mut analyzer = Analyzer::from_config(config).context("Failed to set up LLM provider")?;

    let store: Option<Arc<dyn AnalysisStore>> = match (&args.supabase_url, &args.supabase_key, &args.store_file) {
        (Some(url), Some(key), _) => Some(Arc::new(
            RestStore::new(url, key.clone(), None, timeout).context("Failed to set up store")?,
        )),
        (_, _, Some(path)) => Some(Arc::new(FileStore::new(path.clone()))),
        _ => None,
    };
    if let Some(store) = store {
        analyzer = analyzer.with_store(store);
    }
    Ok(analyzer)
}
