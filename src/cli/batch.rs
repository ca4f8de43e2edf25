use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use futures::future::join_all;
use serde::Serialize;
use sharecode_core_types::{RequesterKey, RunResult, TwoFactorMethod};
use sharecode_scheduler::{PositionCallback, RunScheduler};
use tracing::{info, warn};

use super::context::CliContext;
use super::input::{spawn_code_router, stdin_lines, CodeRouting};
use super::output;
use crate::profile::load_profiles;
use crate::runner::{CodeNotifier, FailureReport};

#[derive(Args, Clone, Debug)]
pub struct BatchArgs {
    /// Profiles file (YAML)
    pub profiles: PathBuf,

    /// Runs allowed at once; defaults to scheduler.concurrency
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Directory for artifacts and diagnostics
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Completed {
        key: RequesterKey,
        label: String,
        #[serde(flatten)]
        result: RunResult,
    },
    Failed {
        key: RequesterKey,
        label: String,
        #[serde(flatten)]
        error: FailureReport,
    },
}

impl BatchOutcome {
    fn is_failure(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub completed: usize,
    pub failed: usize,
    pub runs: Vec<BatchOutcome>,
}

impl BatchSummary {
    fn new(runs: Vec<BatchOutcome>) -> Self {
        let failed = runs.iter().filter(|r| r.is_failure()).count();
        Self {
            completed: runs.len() - failed,
            failed,
            runs,
        }
    }
}

fn human_summary(summary: &BatchSummary) -> String {
    let mut lines = vec![format!(
        "{} completed, {} failed",
        summary.completed, summary.failed
    )];
    for run in &summary.runs {
        lines.push(match run {
            BatchOutcome::Completed { label, result, .. } => format!(
                "  {label}: {} -> {}",
                result.share_code,
                result.artifact_path.display()
            ),
            BatchOutcome::Failed { label, error, .. } => {
                format!("  {label}: {} ({})", error.message, error.kind)
            }
        });
    }
    lines.join("\n")
}

/// Queue index 0 means next in line, not admitted; admission is reported by
/// the job itself.
fn position_notice(label: &str, position: usize) -> String {
    match position {
        0 => format!("[{label}] next in line"),
        ahead => format!("[{label}] waiting, {ahead} ahead"),
    }
}

fn position_reporter(label: String) -> PositionCallback {
    Arc::new(move |position: usize| eprintln!("{}", position_notice(&label, position)))
}

pub async fn cmd_batch(args: BatchArgs, ctx: &CliContext) -> Result<()> {
    let mut config = ctx.config().clone();
    if let Some(concurrency) = args.concurrency {
        config.scheduler.concurrency = concurrency;
    }
    if let Some(dir) = &args.output_dir {
        config.flow.output_dir = dir.clone();
    }
    config.validate()?;

    let profiles = load_profiles(&args.profiles)?;
    info!(
        profiles = profiles.len(),
        concurrency = config.scheduler.concurrency,
        "starting batch"
    );

    let notifier: CodeNotifier = Arc::new(
        |key: &RequesterKey, method: TwoFactorMethod, label: &str| {
            eprintln!("[{label}] security code sent by {method}; enter `{key} <code>`");
        },
    );
    let runner = ctx.runner(&config, notifier)?;
    let router = spawn_code_router(runner.exchange().clone(), CodeRouting::Keyed, stdin_lines());
    let scheduler = RunScheduler::new(config.scheduler_config());

    let jobs = profiles.into_iter().map(|profile| {
        let request = profile.into_request();
        let key = request.key.clone();
        let label = request.label.clone();
        let runner = runner.clone();
        let scheduler = scheduler.clone();
        async move {
            let queued = scheduler
                .enqueue(
                    key.clone(),
                    label.clone(),
                    {
                        let label = label.clone();
                        move || async move {
                            eprintln!("[{label}] starting");
                            runner.execute(request).await
                        }
                    },
                    position_reporter(label.clone()),
                )
                .await;
            match queued {
                Ok(Ok(result)) => BatchOutcome::Completed { key, label, result },
                Ok(Err(failure)) => BatchOutcome::Failed {
                    key,
                    label,
                    error: failure.report(),
                },
                Err(err) => {
                    warn!(%key, %err, "run lost");
                    BatchOutcome::Failed {
                        key,
                        label,
                        error: FailureReport {
                            kind: "internal".to_string(),
                            message: err.to_string(),
                            artifact: None,
                        },
                    }
                }
            }
        }
    });

    let summary = BatchSummary::new(join_all(jobs).await);
    router.abort();

    output::print(ctx.output(), &summary, human_summary)?;
    if summary.failed > 0 {
        bail!("{} of {} runs failed", summary.failed, summary.runs.len());
    }
    Ok(())
}
