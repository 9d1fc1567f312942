//! Run one route search from the command line and print the result as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use route_finder::config::Config;
use route_finder::{SearchError, SearchOrchestrator, SearchRequest};

const EXIT_INPUT_ERROR: u8 = 2;
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "route-finder")]
#[command(author, version, about = "Walking routes from a free-text preference")]
struct Cli {
    /// Travel preference, e.g. "a quiet route with lots of greenery"
    #[arg(short, long)]
    query: Option<String>,

    /// Start position as "lat,lon"
    #[arg(short, long)]
    start: Option<String>,

    /// End position as "lat,lon"
    #[arg(short, long)]
    end: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "ROUTE_FINDER_CONFIG")]
    config: Option<PathBuf>,

    /// Abandon the search after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

/// `RUST_LOG` directives when set and valid, otherwise warnings only.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let request = match SearchRequest::from_params(cli.query.as_deref(), cli.start.as_deref(), cli.end.as_deref()) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("error: {err}");
            return Ok(ExitCode::from(EXIT_INPUT_ERROR));
        }
    };

    let config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => {
            let config = Config::default();
            config.pipeline.validate()?;
            config
        }
    };

    let orchestrator = SearchOrchestrator::from_config(&config).context("initializing search pipeline")?;

    let result = match cli.timeout_secs {
        Some(secs) => orchestrator.search_with_timeout(request, Duration::from_secs(secs)),
        None => orchestrator.search(&request),
    };

    match result {
        Ok(result) => {
            let json = if cli.pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ SearchError::Input(_)) => {
            eprintln!("error: {err}");
            Ok(ExitCode::from(EXIT_INPUT_ERROR))
        }
        Err(err) => Err(err).context("search failed"),
    }
}
