//! This module turns command-line arguments into a ready-to-run console
//! configuration.
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tracing_subscriber::EnvFilter;

use super::args::AppArgs;
use crate::api::client::DEFAULT_BASE_URL;
use crate::logging::{DiagnosticsBuffer, DiagnosticsCollector};

/// Environment variable consulted when `--api-url` is absent.
pub const API_URL_ENV: &str = "LOGAI_API_URL";

const DIAGNOSTICS_CAPACITY: usize = 1000;

/// Everything the console needs once the arguments have been validated.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend address without a trailing slash.
    pub base_url: String,
    pub poll_interval: Duration,
    pub export_dir: PathBuf,
}

pub struct PreparedApp {
    pub config: ConsoleConfig,
    pub diagnostics: Arc<DiagnosticsBuffer>,
}

/// Validates the arguments and installs logging.
///
/// # Errors
///
/// Returns an error for an invalid URL, interval or filter, or if the log
/// file cannot be opened.
pub fn prepare(args: AppArgs) -> Result<PreparedApp> {
    let config = resolve_config(&args, std::env::var(API_URL_ENV).ok())?;
    let diagnostics = Arc::new(DiagnosticsBuffer::new(DIAGNOSTICS_CAPACITY));
    configure_logging(&args, diagnostics.clone())?;

    tracing::info!(
        "Console configured for {} (polling every {:?})",
        config.base_url,
        config.poll_interval
    );

    Ok(PreparedApp {
        config,
        diagnostics,
    })
}

/// Builds the configuration from `args`, with `env_url` standing in for the
/// environment lookup.
pub fn resolve_config(args: &AppArgs, env_url: Option<String>) -> Result<ConsoleConfig> {
    let base_url = resolve_base_url(args.api_url.clone(), env_url)?;
    if args.poll_interval_secs == 0 {
        bail!("--poll-interval-secs must be at least 1");
    }
    Ok(ConsoleConfig {
        base_url,
        poll_interval: Duration::from_secs(args.poll_interval_secs),
        export_dir: args.export_dir.clone(),
    })
}

/// Picks the flag, then the environment, then the default; blank values are
/// skipped.
fn resolve_base_url(flag: Option<String>, env_url: Option<String>) -> Result<String> {
    let raw = flag
        .into_iter()
        .chain(env_url)
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let url = raw.trim_end_matches('/').to_string();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow!(
            "Backend URL '{}' must start with http:// or https://",
            raw
        ));
    }
    Ok(url)
}

fn configure_logging(args: &AppArgs, diagnostics: Arc<DiagnosticsBuffer>) -> Result<()> {
    let filter = EnvFilter::try_new(&args.log_level)
        .with_context(|| format!("Invalid --log-level '{}'", args.log_level))?;

    let log_file = args
        .log_file
        .as_ref()
        .map(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Could not open log file {}", path.display()))
        })
        .transpose()?;

    DiagnosticsCollector::init_subscriber(diagnostics, filter, log_file)
        .map_err(|e| anyhow!("Failed to install logging: {}", e))
}
