use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Render `value` for stdout; `human` supplies the plain-text rendition.
pub fn render<T: Serialize>(
    format: OutputFormat,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human(value)),
        OutputFormat::Json => serde_json::to_string_pretty(value).context("serialize output"),
        OutputFormat::Yaml => serde_yaml::to_string(value).context("serialize output"),
    }
}

pub fn print<T: Serialize>(
    format: OutputFormat,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> Result<()> {
    let rendered = render(format, value, human)?;
    println!("{}", rendered.trim_end());
    Ok(())
}
