use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::output::LogFormat;
use crate::config::AppConfig;

/// Install the global subscriber. `RUST_LOG` wins over `level`; logs go to
/// stderr so stdout carries only command output.
pub fn init_logging(level: &str, debug: bool, format: LogFormat) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .context("Failed to install tracing subscriber")?;

    Ok(())
}

pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let config = AppConfig::load(explicit)?;
    info!(
        start_url = %config.start_url,
        concurrency = config.scheduler.concurrency,
        output_dir = %config.flow.output_dir.display(),
        "configuration loaded"
    );
    Ok(config)
}
