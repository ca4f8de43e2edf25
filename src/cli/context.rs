use std::sync::Arc;

use action_flow::FlowEngine;
use anyhow::{Context, Result};
use cdp_adapter::ChromiumLauncher;
use code_broker::TwoFactorExchange;
use sharecode_recipes::default_catalog;

use super::output::OutputFormat;
use crate::config::AppConfig;
use crate::runner::{CodeNotifier, SessionRunner};

pub struct CliContext {
    config: Arc<AppConfig>,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(config: AppConfig, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            output,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    pub fn engine(&self) -> Result<FlowEngine> {
        let catalog = default_catalog().context("Failed to build step catalog")?;
        Ok(FlowEngine::new(Arc::new(catalog)))
    }

    /// Runner over a fresh exchange, launching Chromium per run.
    pub fn runner(&self, config: &AppConfig, notifier: CodeNotifier) -> Result<SessionRunner> {
        let launcher = ChromiumLauncher::new(config.cdp_config()?);
        Ok(SessionRunner::new(
            Arc::new(launcher),
            self.engine()?,
            Arc::new(TwoFactorExchange::new()),
            config.start_url.clone(),
        )
        .with_options(config.run_options()?)
        .with_wait_policy(config.wait_policy()?)
        .with_notifier(notifier))
    }
}
