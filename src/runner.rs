//! Composition of launcher, engine and code exchange for one requester run

use std::path::PathBuf;
use std::sync::Arc;

use action_flow::{CodeProvider, FlowEngine, FlowError, RunContext, RunOptions};
use action_primitives::{SurfaceLauncher, WaitPolicy};
use async_trait::async_trait;
use code_broker::{TwoFactorError, TwoFactorExchange};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sharecode_core_types::{Credentials, Purpose, RequesterKey, RunResult, TwoFactorMethod};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

static CODE_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4,8}$").expect("code candidate pattern"));

/// Told when a run starts waiting for a security code: requester, delivery
/// method and run label.
pub type CodeNotifier = Arc<dyn Fn(&RequesterKey, TwoFactorMethod, &str) + Send + Sync>;

/// Everything needed to run the flow once for one requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub key: RequesterKey,
    pub label: String,
    pub credentials: Credentials,
    pub purpose: Purpose,
    /// Overrides the configured artifact path for this run
    pub output_file: Option<PathBuf>,
}

/// A failed run together with the diagnostics captured for it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    pub error: FlowError,
    pub artifact: Option<PathBuf>,
}

impl RunFailure {
    pub fn report(&self) -> FailureReport {
        FailureReport {
            kind: self.error.kind().as_str().to_string(),
            message: self.error.to_string(),
            artifact: self.artifact.clone(),
        }
    }
}

impl From<FlowError> for RunFailure {
    fn from(error: FlowError) -> Self {
        let artifact = error.artifact().cloned();
        Self { error, artifact }
    }
}

/// User-facing summary of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

pub(crate) fn flow_error_from(err: TwoFactorError) -> FlowError {
    match err {
        TwoFactorError::Timeout { label } => FlowError::TwoFactorTimeout { label },
        TwoFactorError::Superseded => FlowError::Superseded,
        TwoFactorError::Abandoned => FlowError::domain("code request abandoned"),
    }
}

/// Parks the run in the exchange under the requester's key.
struct ExchangeCodeProvider {
    exchange: Arc<TwoFactorExchange>,
    key: RequesterKey,
    notifier: Option<CodeNotifier>,
}

#[async_trait]
impl CodeProvider for ExchangeCodeProvider {
    async fn provide(
        &self,
        method: TwoFactorMethod,
        label: &str,
        deadline: Instant,
    ) -> Result<String, FlowError> {
        if let Some(notify) = &self.notifier {
            notify(&self.key, method, label);
        }
        self.exchange
            .request_code(self.key.clone(), method, label, deadline)
            .await
            .map_err(flow_error_from)
    }
}

/// Inbound text interception: submits `text` as a code when it looks like one
/// and `key` has a pending request. Returns whether it was consumed.
pub fn submit_candidate(exchange: &TwoFactorExchange, key: &RequesterKey, text: &str) -> bool {
    let text = text.trim();
    if !CODE_CANDIDATE.is_match(text) {
        return false;
    }
    if !exchange.has_pending(key) {
        debug!(%key, "code-like input with nothing pending");
        return false;
    }
    exchange.submit_code(key, text)
}

/// Runs the flow end to end for one request: launch, drive, diagnose, close.
#[derive(Clone)]
pub struct SessionRunner {
    launcher: Arc<dyn SurfaceLauncher>,
    engine: FlowEngine,
    exchange: Arc<TwoFactorExchange>,
    start_url: String,
    options: RunOptions,
    wait: WaitPolicy,
    notifier: Option<CodeNotifier>,
}

impl SessionRunner {
    pub fn new(
        launcher: Arc<dyn SurfaceLauncher>,
        engine: FlowEngine,
        exchange: Arc<TwoFactorExchange>,
        start_url: impl Into<String>,
    ) -> Self {
        Self {
            launcher,
            engine,
            exchange,
            start_url: start_url.into(),
            options: RunOptions::default(),
            wait: WaitPolicy::default(),
            notifier: None,
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_notifier(mut self, notifier: CodeNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn exchange(&self) -> &Arc<TwoFactorExchange> {
        &self.exchange
    }

    pub async fn execute(&self, request: RunRequest) -> Result<RunResult, RunFailure> {
        let RunRequest {
            key,
            label,
            credentials,
            purpose,
            output_file,
        } = request;

        let surface = self.launcher.launch().await.map_err(FlowError::from)?;
        let provider = ExchangeCodeProvider {
            exchange: self.exchange.clone(),
            key: key.clone(),
            notifier: self.notifier.clone(),
        };
        let mut options = self.options.clone();
        if output_file.is_some() {
            options.output_file = output_file;
        }
        let mut ctx = RunContext::new(surface.clone(), credentials, Arc::new(provider))
            .with_label(label)
            .with_purpose(purpose)
            .with_options(options)
            .with_wait_policy(self.wait);
        info!(%key, label = %ctx.label, run_id = %ctx.run_id, "run started");

        let outcome = match self.engine.run(&mut ctx, &self.start_url).await {
            Ok(result) => Ok(result),
            Err(err) => {
                error!(%key, label = %ctx.label, kind = err.kind().as_str(), %err, "run failed");
                let mut failure = RunFailure::from(err);
                if ctx.options.screenshot_on_error && failure.artifact.is_none() {
                    failure.artifact = self.engine.capture(&ctx, "error").await.primary();
                }
                Err(failure)
            }
        };

        if let Err(err) = surface.close().await {
            warn!(%key, %err, "failed to close surface");
        }
        outcome
    }
}
