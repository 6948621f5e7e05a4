//! `RateLens` CLI - Run extraction rules over bank report documents

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ratelens::fetch::DocumentLocation;
use ratelens::orchestrator::extract_document;
use ratelens::{
    Config, DefaultFetcher, DocumentFetcher, DocumentFormat, LineReconstructor, Orchestrator,
    SourceStatus,
};

#[derive(Parser)]
#[command(name = "ratelens")]
#[command(about = "Extract labeled figures from positional document text")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.config/ratelens/sources.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the reconstructed lines of a document
    Lines {
        /// Document file
        file: PathBuf,

        /// Document format (tokens, html, pdf); guessed from the extension if omitted
        #[arg(short, long)]
        format: Option<DocumentFormat>,

        /// Vertical tolerance for grouping tokens into lines
        #[arg(short, long, default_value_t = ratelens::layout::DEFAULT_LINE_TOLERANCE)]
        tolerance: f64,
    },

    /// Run one configured source and print its result as JSON
    Extract {
        /// Source id from the configuration
        source: String,

        /// Read this file instead of the configured document
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Run all sources and print the snapshot as JSON
    ///
    /// Each invocation fetches every source; the snapshot cache lives only as
    /// long as the process.
    Run,

    /// Validate the configuration and summarize it
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Commands::Lines { file, format, tolerance } => cmd_lines(&file, format, tolerance)?,
        Commands::Extract { source, file } => {
            cmd_extract(cli.config.as_deref(), &source, file).await?;
        }
        Commands::Run => cmd_run(cli.config.as_deref()).await?,
        Commands::Check => cmd_check(cli.config.as_deref())?,
    }

    Ok(())
}

fn cmd_lines(file: &Path, format: Option<DocumentFormat>, tolerance: f64) -> Result<()> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        anyhow::bail!("tolerance must be a non-negative number, got {tolerance}");
    }
    let format = format
        .or_else(|| DocumentFormat::from_path(&file.to_string_lossy()))
        .unwrap_or_default();
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let tokens = format.source()?.tokens(&bytes)?;

    let lines = LineReconstructor::new(tolerance).reconstruct(&tokens);
    for (index, line) in lines.iter().enumerate() {
        println!("{index:>4}  p{:<3} y={:<9.2} {}", line.page, line.y, line.text);
    }
    eprintln!("{} tokens, {} lines ({format})", tokens.len(), lines.len());
    Ok(())
}

async fn cmd_extract(config_path: Option<&Path>, id: &str, file: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path)?;
    let mut source = config
        .source(id)
        .cloned()
        .with_context(|| format!("unknown source '{id}'"))?;

    if let Some(path) = file {
        if source.format.is_none() {
            source.format = DocumentFormat::from_path(&path.to_string_lossy());
        }
        source.document = DocumentLocation::Path { path };
    }

    let bytes = DefaultFetcher::new()?.fetch(&source.document).await?;
    let result = extract_document(&source, &config.settings, &bytes)?;
    if result.is_none() {
        tracing::warn!(
            "{id}: mandatory field '{}' not found",
            source.rules.confidence.total_field
        );
    }
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let orchestrator = Orchestrator::init(config, Arc::new(DefaultFetcher::new()?))?;
    let snapshot = orchestrator.get(false).await;

    println!("{}", serde_json::to_string_pretty(&*snapshot)?);
    eprintln!(
        "{} live, {} fallback, {} unavailable",
        snapshot.count(SourceStatus::Live),
        snapshot.count(SourceStatus::Fallback),
        snapshot.count(SourceStatus::Unavailable)
    );
    Ok(())
}

fn cmd_check(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.map_or_else(ratelens::config::config_path, Path::to_path_buf);
    let config = Config::load(config_path)?;

    println!("Configuration: {}", path.display());
    println!(
        "Settings: tolerance {}, cache TTL {}s, concurrency {}",
        config.settings.line_tolerance,
        config.settings.cache_ttl_secs,
        config.settings.max_concurrency
    );
    println!("Sources: {}", config.sources.len());
    for source in &config.sources {
        let reference = if config.reference_for(&source.id).is_some() {
            "reference"
        } else {
            "no reference"
        };
        println!(
            "  {:<12} {:<6} {} fields, total '{}', {reference}",
            source.id,
            source.format(),
            source.rules.fields.len(),
            source.rules.confidence.total_field
        );
    }
    println!("Reference entries: {}", config.reference.len());
    Ok(())
}
