//! Tracing subscriber setup
//!
//! Console output always; with `--log` a second, plain-text layer appends to
//! a timestamped file in the working directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use service_cleaner_common::defaults::{FILE_TIMESTAMP_FORMAT, LOG_FILE_PREFIX};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter: our own events at info, AWS SDK chatter at warn
const DEFAULT_FILTER: &str = "info,aws_config=warn,aws_sdk_ec2=warn,aws_sdk_s3=warn,aws_sdk_sts=warn,aws_smithy_runtime=warn";

/// Log file name for a run started at `now`
pub fn log_file_name(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("{LOG_FILE_PREFIX}{}.log", now.format(FILE_TIMESTAMP_FORMAT)))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")
}
