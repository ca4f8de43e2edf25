//! Layered application configuration
//!
//! Sources, lowest precedence first: built-in defaults, `config/sharecode.yaml`
//! (or `<config dir>/sharecode/config.yaml`), an explicit `--config` file, and
//! `SHARECODE__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use action_flow::RunOptions;
use action_primitives::WaitPolicy;
use anyhow::{bail, Context, Result};
use cdp_adapter::CdpConfig;
use serde::{Deserialize, Serialize};
use sharecode_recipes::DEFAULT_START_URL;
use sharecode_scheduler::SchedulerConfig;

pub const MAX_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub start_url: String,
    pub scheduler: SchedulerSettings,
    pub flow: FlowSettings,
    pub browser: BrowserSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            scheduler: SchedulerSettings::default(),
            flow: FlowSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub concurrency: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            concurrency: SchedulerConfig::default().concurrency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    pub max_steps: usize,
    pub detect_retries: usize,
    /// humantime duration, e.g. `10m`
    pub two_factor_timeout: String,
    pub capture_steps: bool,
    pub screenshot_on_error: bool,
    pub output_dir: PathBuf,
    pub output_file: Option<PathBuf>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        let run = RunOptions::default();
        Self {
            max_steps: run.max_steps,
            detect_retries: run.detect_retries,
            two_factor_timeout: "10m".to_string(),
            capture_steps: run.capture_steps,
            screenshot_on_error: run.screenshot_on_error,
            output_dir: run.output_dir,
            output_file: run.output_file,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub no_sandbox: bool,
    pub executable: Option<PathBuf>,
    pub user_data_dir: Option<PathBuf>,
    pub navigation_timeout: String,
    pub action_timeout: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        let cdp = CdpConfig::default();
        Self {
            headless: cdp.headless,
            no_sandbox: cdp.no_sandbox,
            executable: None,
            user_data_dir: None,
            navigation_timeout: "60s".to_string(),
            action_timeout: "30s".to_string(),
        }
    }
}

fn parse_duration(field: &str, raw: &str) -> Result<Duration> {
    humantime::parse_duration(raw.trim())
        .with_context(|| format!("invalid duration for {field}: `{raw}`"))
}

fn default_file() -> Option<PathBuf> {
    let local = PathBuf::from("config/sharecode.yaml");
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("sharecode").join("config.yaml"))
        .filter(|path| path.exists())
}

impl AppConfig {
    /// Merge every configuration source and validate the result.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let defaults =
            serde_json::to_string(&AppConfig::default()).context("serialize default config")?;
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults,
            config::FileFormat::Json,
        ));

        if let Some(path) = default_file() {
            builder = builder.add_source(config::File::from(path));
        }
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("SHARECODE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let merged: AppConfig = builder
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<()> {
        let concurrency = self.scheduler.concurrency;
        if !(1..=MAX_CONCURRENCY).contains(&concurrency) {
            bail!("scheduler.concurrency must be within 1..={MAX_CONCURRENCY}, got {concurrency}");
        }
        if self.flow.max_steps == 0 {
            bail!("flow.max_steps must be positive");
        }
        if self.start_url.trim().is_empty() {
            bail!("start_url must not be empty");
        }
        parse_duration("flow.two_factor_timeout", &self.flow.two_factor_timeout)?;
        parse_duration("browser.navigation_timeout", &self.browser.navigation_timeout)?;
        parse_duration("browser.action_timeout", &self.browser.action_timeout)?;
        Ok(())
    }

    pub fn run_options(&self) -> Result<RunOptions> {
        Ok(RunOptions {
            capture_steps: self.flow.capture_steps,
            screenshot_on_error: self.flow.screenshot_on_error,
            output_dir: self.flow.output_dir.clone(),
            output_file: self.flow.output_file.clone(),
            two_factor_timeout: parse_duration(
                "flow.two_factor_timeout",
                &self.flow.two_factor_timeout,
            )?,
            max_steps: self.flow.max_steps,
            detect_retries: self.flow.detect_retries,
        })
    }

    pub fn wait_policy(&self) -> Result<WaitPolicy> {
        let action = parse_duration("browser.action_timeout", &self.browser.action_timeout)?;
        Ok(WaitPolicy::default().with_action_timeout(action))
    }

    pub fn cdp_config(&self) -> Result<CdpConfig> {
        let navigation =
            parse_duration("browser.navigation_timeout", &self.browser.navigation_timeout)?;
        Ok(CdpConfig {
            executable: self.browser.executable.clone(),
            user_data_dir: self.browser.user_data_dir.clone(),
            headless: self.browser.headless,
            no_sandbox: self.browser.no_sandbox,
            nav_timeout_ms: navigation.as_millis() as u64,
            ..CdpConfig::default()
        })
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            concurrency: self.scheduler.concurrency,
        }
    }
}
