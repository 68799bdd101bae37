//! copy command - Copy recent objects from one bucket to another
//!
//! Lists the source bucket, skips objects older than the retention window,
//! and copies the rest with a pool of concurrent workers. Keys are kept as-is
//! and source objects are never deleted.

use std::sync::Arc;
use std::time::Duration;

use bcp_core::{Config, ConfigManager, Coordinator, RetryBuilder, RunConfig, S3Settings};
use bcp_s3::S3Client;
use clap::Args;

use crate::exit_code::ExitCode;
use crate::output::{ConsoleObserver, CopyReport, Formatter, OutputConfig};

/// Copy objects between buckets
#[derive(Args, Debug, Clone)]
pub struct CopyArgs {
    /// The source bucket to copy from
    #[arg(short = 's', long)]
    pub source_bucket: String,

    /// The destination bucket to copy to
    #[arg(short = 'd', long)]
    pub dest_bucket: String,

    /// Maximum age of objects to copy, in days [default: 365]
    #[arg(short = 'r', long, value_name = "DAYS", value_parser = clap::value_parser!(i64).range(0..))]
    pub retention: Option<i64>,

    /// Number of concurrent copy workers [default: number of CPUs]
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Requests buffered ahead of the workers [default: 4 per worker]
    #[arg(long)]
    pub queue_depth: Option<usize>,

    /// Give up on a single copy after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Retry throttled or timed-out copies this many times [default: 0]
    #[arg(long)]
    pub retries: Option<u32>,

    /// AWS region
    #[arg(long)]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible services
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Named profile from the shared AWS config
    #[arg(long)]
    pub profile: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long)]
    pub path_style: bool,
}

/// Execute the copy command
pub async fn execute(args: CopyArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let config = match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to load config: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let run_config = build_run_config(&args, &config);
    if let Err(e) = run_config.validate() {
        formatter.error(&e.to_string());
        return ExitCode::UsageError;
    }

    tracing::debug!(?run_config, "Resolved run configuration");

    let client = match S3Client::new(&build_s3_settings(&args, &config)).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let observer = Arc::new(ConsoleObserver::new(
        formatter.clone(),
        output_config.progress && !formatter.is_quiet(),
    ));
    let coordinator = Coordinator::new(Arc::new(client), run_config, observer.clone());

    let result = coordinator.run().await;
    observer.finish();

    match result {
        Ok(summary) => {
            formatter.report(&CopyReport::new(coordinator.config(), &summary));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

/// Merge command-line flags over config file defaults
fn build_run_config(args: &CopyArgs, config: &Config) -> RunConfig {
    let mut run = RunConfig::new(&args.source_bucket, &args.dest_bucket, &config.defaults);

    if let Some(days) = args.retention {
        run.retention_days = days;
    }
    if let Some(jobs) = args.jobs {
        run = run.with_concurrency(jobs);
    }
    if let Some(depth) = args.queue_depth {
        run.queue_depth = depth;
    }
    if let Some(secs) = args.timeout {
        run.task_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(retries) = args.retries {
        run.retry = RetryBuilder::new()
            .retries(retries)
            .initial_backoff_ms(run.retry.initial_backoff_ms)
            .max_backoff_ms(run.retry.max_backoff_ms)
            .build();
    }

    run
}

fn build_s3_settings(args: &CopyArgs, config: &Config) -> S3Settings {
    let mut settings = config.s3.clone();

    if let Some(region) = &args.region {
        settings.region = Some(region.clone());
    }
    if let Some(endpoint) = &args.endpoint_url {
        settings.endpoint_url = Some(endpoint.clone());
    }
    if let Some(profile) = &args.profile {
        settings.profile = Some(profile.clone());
    }
    if args.path_style {
        settings.force_path_style = true;
    }

    settings
}
