//! `batchctl` — CLI entry point (A6).
//!
//! Loads configuration, builds the reference `HttpTransform`, and runs the
//! orchestrator to completion.

use batch_engine::{Config, EngineError, HttpTransform, Orchestrator};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "batchctl", about = "Run a batch of records through an HTTP transform")]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long)]
    config: PathBuf,

    /// URL the reference transform POSTs each record to.
    #[arg(long)]
    endpoint: String,

    /// Per-request timeout for the reference transform, in seconds.
    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,

    /// Override the config file's max_concurrency.
    #[arg(long)]
    max_concurrency: Option<u32>,

    /// Override the config file's requests_per_minute.
    #[arg(long)]
    requests_per_minute: Option<i64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("batchctl: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), EngineError> {
    let mut config = Config::load_from_path(&args.config)?.apply_env_overrides()?;

    if let Some(max_concurrency) = args.max_concurrency {
        config.max_concurrency = max_concurrency;
    }
    if let Some(requests_per_minute) = args.requests_per_minute {
        config.requests_per_minute = requests_per_minute;
    }

    batch_engine::init_logging(&config.log_file, config.log_level)
        .map_err(|source| EngineError::OutputDir {
            path: config.log_file.display().to_string(),
            source,
        })?;

    let transform = Arc::new(
        HttpTransform::new(args.endpoint, Duration::from_secs(args.request_timeout_secs))
            .map_err(|err| EngineError::Startup(err.to_string()))?,
    );

    let orchestrator = Orchestrator::new(config, transform, None);
    orchestrator.run().await?;

    Ok(())
}
