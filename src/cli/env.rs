use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;
use super::output::{LogFormat, OutputFormat};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}
