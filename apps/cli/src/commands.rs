//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use newsbrief_core::{Collaborators, Pipeline, RunOutput, SeedInput};
use newsbrief_crawler::ReqwestFetcher;
use newsbrief_llm::OpenAiClient;
use newsbrief_report::{
    DocumentRenderer, JsonRenderer, MarkdownRenderer, RenderContext, WrittenDocument,
    default_file_name, write_document,
};
use newsbrief_search::{NaverSearch, SearchProvider};
use newsbrief_shared::{
    AppConfig, DateWindow, PipelineConfig, init_config, load_config, validate_config,
    validate_credentials,
};
use tracing::{info, warn};

use crate::progress::CliProgress;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// NewsBrief: summarize how the press covers a story.
#[derive(Parser)]
#[command(
    name = "newsbrief",
    version,
    about = "Turn one news article into a multi-source briefing with references.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build a briefing from a seed article.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
pub(crate) struct RunArgs {
    /// URL of the seed article.
    url: String,

    /// Output file (defaults to newsbrief-<timestamp>.md in the current directory).
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Only keep related articles published on or after this date (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only keep related articles published on or before this date (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Number of search keywords to derive.
    #[arg(long)]
    max_keywords: Option<usize>,

    /// Number of related articles to fetch.
    #[arg(long)]
    max_candidates: Option<usize>,

    /// Concurrent article fetches.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Write the report as JSON instead of Markdown.
    #[arg(long)]
    json: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "newsbrief=warn",
        1 => "newsbrief=info",
        2 => "newsbrief=debug",
        _ => "newsbrief=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(args: RunArgs) -> Result<()> {
    // A missing .env file is fine; the variables may come from the shell.
    if let Ok(path) = dotenvy::dotenv() {
        info!(path = %path.display(), "loaded environment file");
    }

    let mut config = load_config()?;
    apply_overrides(&mut config, &args);
    validate_config(&config)?;
    validate_credentials(&config)?;

    let mut pipeline_config = PipelineConfig::from(&config);
    pipeline_config.date_window = date_window(args.from, args.to)?;

    let collaborators = Collaborators {
        completion: Arc::new(OpenAiClient::from_config(&config.llm)?),
        search: search_provider(&config, &pipeline_config)?,
        fetcher: Arc::new(ReqwestFetcher::new(&config.fetch.user_agent)?),
    };
    let pipeline = Pipeline::new(&pipeline_config, collaborators);

    let token = pipeline.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            token.cancel();
        }
    });

    info!(url = %args.url, "building briefing");

    let progress = CliProgress::new();
    let outcome = pipeline.run(SeedInput::Url(args.url.clone()), &progress).await;
    progress.finish();

    let output = match outcome {
        Ok(output) => output,
        Err(aborted) => {
            eprintln!();
            eprintln!("  Briefing failed while {}.", aborted.stage.label());
            eprintln!("  Reason: {}", aborted.source);
            if let Some(retained) = aborted.retained.as_ref().filter(|c| !c.is_empty()) {
                eprintln!(
                    "  {} article(s) had been collected before the run stopped.",
                    retained.len()
                );
            }
            eprintln!();
            return Err(aborted.into());
        }
    };

    let renderer: Box<dyn DocumentRenderer> = if args.json {
        Box::new(JsonRenderer)
    } else {
        Box::new(MarkdownRenderer)
    };
    let ctx = RenderContext::new(Utc::now()).with_failed(output.stats.failed.clone());
    let bytes = renderer.render(&output.report, &ctx)?;
    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(default_file_name(&ctx, renderer.as_ref())));
    let written = write_document(&path, &bytes)?;

    print_summary(&output, &written);
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &RunArgs) {
    if let Some(n) = args.max_keywords {
        config.pipeline.max_keywords = n;
    }
    if let Some(n) = args.max_candidates {
        config.pipeline.max_candidates = n;
    }
    if let Some(n) = args.concurrency {
        config.fetch.concurrency = n;
    }
}

/// An open-ended bound defaults to the beginning of time or to today.
fn date_window(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Option<DateWindow>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    let from = from.unwrap_or(NaiveDate::MIN);
    let to = to.unwrap_or_else(|| Local::now().date_naive());
    Ok(Some(DateWindow::new(from, to)?))
}

fn search_provider(
    config: &AppConfig,
    pipeline: &PipelineConfig,
) -> Result<Arc<dyn SearchProvider>> {
    match config.search.provider.as_str() {
        "naver" => Ok(Arc::new(NaverSearch::from_config(
            &config.search,
            pipeline.fetch_timeout,
        )?)),
        other => Err(eyre!(
            "unknown search provider '{other}': expected 'naver'"
        )),
    }
}

fn print_summary(output: &RunOutput, written: &WrittenDocument) {
    let stats = &output.stats;
    println!();
    println!("  Briefing ready!");
    println!("  Seed:     {}", output.report.seed.title);
    println!("  Keywords: {}", output.report.keywords.join(", "));
    println!(
        "  Sources:  {} used ({} of {} candidates failed, {} duplicates)",
        output.report.sources.len(),
        stats.failed_count(),
        stats.attempted,
        stats.duplicates
    );
    println!("  Path:     {}", written.path.display());
    println!("  Time:     {:.1}s", output.elapsed_ms as f64 / 1000.0);
    println!();
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
