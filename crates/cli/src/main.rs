//! bcp - concurrent bucket-to-bucket copy with a retention window
//!
//! Copies every object modified within the last `--retention` days from the
//! source bucket to the destination bucket, keeping keys unchanged.

mod commands;
mod exit_code;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::copy::{self, CopyArgs};
use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Copy objects newer than a retention window from one bucket to another
#[derive(Parser, Debug)]
#[command(name = "bcp", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    copy: CopyArgs,

    /// Output a JSON summary instead of text
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,

    /// Show a progress spinner on stderr
    #[arg(long)]
    progress: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let filter = if debug {
        EnvFilter::new("warn,bcp_core=debug,bcp_s3=debug,bcp=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.debug) {
        eprintln!("{e:#}");
        return ExitCode::GeneralError.into();
    }

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
        progress: cli.progress,
    };

    copy::execute(cli.copy, output_config).await.into()
}
