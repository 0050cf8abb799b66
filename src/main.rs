//! handlecheck - concurrent username availability checker
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use handlecheck::runtime::config::{CheckerConfig, DEFAULT_WORKER_COUNT};
use handlecheck::scan::collector::PrintHandler;
use handlecheck::{HandleChecker, NameList, Runner};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_ENDPOINT: &str = "https://github.com/signup_check/username";
const DEFAULT_SESSION_URL: &str = "https://github.com/session";

/// Checks a list of candidate handles against a signup endpoint and prints
/// the available ones as they are found.
#[derive(Parser, Debug)]
#[command(
    name = "handlecheck",
    version,
    about = "Concurrent username availability checker",
    long_about = "Reads candidate handles from a file or stdin, partitions them across \
                  concurrent workers, and prints each handle the signup endpoint reports \
                  as available, followed by a summary with the total count and elapsed time."
)]
struct CliArgs {
    /// File containing candidate handles, one per line (reads stdin when omitted)
    #[arg(short, long, value_name = "FILE")]
    path: Option<PathBuf>,

    /// How many workers probe concurrently (more workers are faster but more
    /// prone to rate limiting)
    #[arg(short, long, default_value_t = DEFAULT_WORKER_COUNT, value_name = "NUM")]
    workers: usize,

    /// Pause observed by a worker after each available handle, in milliseconds
    #[arg(long, default_value_t = 100, value_name = "MS")]
    sleep: u64,

    /// Per-probe timeout in seconds
    #[arg(long, default_value_t = 10, value_name = "SECS")]
    timeout: u64,

    /// Signup-check endpoint the probe posts to
    #[arg(long, default_value = DEFAULT_ENDPOINT, value_name = "URL")]
    endpoint: String,

    /// Session page used to bootstrap the anti-CSRF token
    #[arg(long, default_value = DEFAULT_SESSION_URL, value_name = "URL")]
    session_url: String,

    /// Skip the session bootstrap and probe without a token
    #[arg(long)]
    no_session: bool,

    /// Verbose output (debug-level logging)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose);

    let names = match &args.path {
        Some(path) => NameList::from_path(path)?,
        None => NameList::from_stdin()?,
    };

    let mut builder = CheckerConfig::builder()
        .endpoint_url(&args.endpoint)
        .worker_count(args.workers)
        .pace_delay(Duration::from_millis(args.sleep))
        .probe_timeout(Duration::from_secs(args.timeout));
    if !args.no_session {
        builder = builder.session_url(&args.session_url);
    }
    let config = builder.build().context("invalid configuration")?;

    let effective = handlecheck::resolve_worker_count(names.len(), config.worker_count());
    println!(
        "Starting handlecheck. Checking {} handles with {} workers.",
        names.len(),
        effective
    );

    let checker = HandleChecker::connect(config, PrintHandler)
        .await
        .context("failed to initialize probe")?;
    let runner = Runner::new(checker);

    let report = runner.run_until_ctrl_c(&names).await?;

    println!(
        "Found {} results in {:.3} seconds",
        report.matched,
        report.elapsed.as_secs_f64()
    );

    Ok(())
}

fn setup_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
