//! Issue Label Worker
//!
//! Pulls issue events from the configured subscription, one at a time, and
//! labels each issue.
//!
//! # Usage
//!
//! ```bash
//! # Layered configuration: config/default.toml, config/$ISSUE_LABEL_ENV.toml,
//! # then ISSUE_LABEL__* environment variables
//! issue-label-worker
//!
//! # Single configuration file
//! issue-label-worker --config /path/to/config.toml
//!
//! # More logging (-v debug, -vv trace); RUST_LOG wins when set
//! issue-label-worker -v
//!
//! # Write a repo's .labels thresholds using the [calibration] floors
//! issue-label-worker calibrate --input holdout.json --output examples.labels
//! ```
//!
//! Ctrl-C stops pulling; the message in flight is still acknowledged.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use issue_label_core::config::LoggingConfig;
use issue_label_core::Config;
use issue_label_worker::{bootstrap, calibration};

#[derive(Parser, Debug)]
#[command(name = "issue-label-worker")]
#[command(about = "Predicts and applies labels to GitHub issues from a queue")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Calibrate per-label thresholds from scored held-out rows and write
    /// the `.labels` file.
    Calibrate {
        /// JSON with `labels`, `predicted` and `truth`.
        #[arg(long)]
        input: PathBuf,

        /// Destination `.labels` YAML.
        #[arg(long)]
        output: PathBuf,
    },
}

fn effective_level(configured: &str, verbose: u8) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig, verbose: u8) {
    let level = effective_level(&logging.level, verbose);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.init(),
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging is configured from the file, so the config loads first.
    let config = load_config(&args)?;
    init_logging(&config.logging, args.verbose);

    if let Some(Command::Calibrate { input, output }) = &args.command {
        let report = calibration::calibrate_holdout(&config.calibration, input, output).await?;
        info!(predictable = report.predictable_count(), "Calibration complete");
        return Ok(());
    }

    info!(config = ?args.config, "Issue Label Worker starting");

    let consumer = match bootstrap::build_consumer(&config) {
        Ok(consumer) => consumer,
        Err(e) => {
            error!(kind = e.kind(), error = %e, "Failed to build consumer");
            return Err(e.into());
        }
    };

    let shutdown = consumer.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.shutdown(),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    consumer.run().await;

    info!(stats = ?consumer.stats(), "Issue Label Worker shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_level() {
        assert_eq!(effective_level("info", 0), "info");
        assert_eq!(effective_level("info", 1), "debug");
        assert_eq!(effective_level("warn", 3), "trace");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["issue-label-worker", "--config", "worker.toml", "-vv"]);
        assert_eq!(args.config, Some(PathBuf::from("worker.toml")));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_calibrate_subcommand_parse() {
        let args = Args::parse_from([
            "issue-label-worker",
            "calibrate",
            "--input",
            "holdout.json",
            "--output",
            "examples.labels",
        ]);
        assert_eq!(
            args.command,
            Some(Command::Calibrate {
                input: PathBuf::from("holdout.json"),
                output: PathBuf::from("examples.labels"),
            })
        );
        assert!(Args::parse_from(["issue-label-worker"]).command.is_none());
    }
}
