//! Command-line entry point.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use sdscout::config::{ScoutConfig, StorageConfig};
use sdscout::events::LoggingEventSink;
use sdscout::identifier::IdentifierRequest;
use sdscout::observability::{init_tracing, LogFormat, DEFAULT_LOG_DIRECTIVE};
use sdscout::pipeline::Scout;

#[derive(Parser, Debug)]
#[command(name = "sdscout", version, about = "Locate, download and verify Safety Data Sheets")]
struct Cli {
    #[arg(long, global = true, help = "JSON configuration file")]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Search API URL template with a {query} and optional {count} placeholder"
    )]
    search_endpoint: Option<String>,
    #[arg(long, global = true, help = "Directory holding unverified/, verified/ and logs/")]
    storage_root: Option<PathBuf>,
    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process a JSON array of {cas?, name?, urls?} records.
    Run { input: PathBuf },
    /// Look up a single CAS number or substance name.
    Lookup { value: String },
}

fn load_config(cli: &Cli) -> Result<ScoutConfig> {
    let mut config = match &cli.config {
        Some(path) => ScoutConfig::from_json_file(path)?,
        None => ScoutConfig::default(),
    };
    if let Some(endpoint) = &cli.search_endpoint {
        config.search.endpoint = Some(endpoint.clone());
    }
    if let Some(root) = &cli.storage_root {
        config.storage = StorageConfig::rooted_at(root);
    }
    config.validate()?;
    Ok(config)
}

fn read_requests(path: &Path) -> Result<Vec<IdentifierRequest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not a list of requests", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format, DEFAULT_LOG_DIRECTIVE)?;

    let config = load_config(&cli)?;
    let scout = Scout::from_config(config)?.with_event_sink(Arc::new(LoggingEventSink::default()));

    let outcome = match &cli.command {
        Commands::Run { input } => {
            let requests = read_requests(input)?;
            scout.run(&requests).await?
        }
        Commands::Lookup { value } => scout.lookup(value).await?,
    };

    println!("{}", outcome.report.to_json_pretty()?);
    info!(
        run_id = %outcome.run_id,
        promoted = outcome.stats.promoted,
        log_file = ?outcome.log_file,
        "Done"
    );
    Ok(())
}
