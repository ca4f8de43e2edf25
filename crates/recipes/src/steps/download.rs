use std::path::Path;

use action_flow::{FlowError, RunContext, Step};
use action_primitives::{Locator, Surface, TextMatch, WaitPolicy};
use async_trait::async_trait;
use sharecode_core_types::RunResult;
use tracing::{debug, info, warn};

use crate::extract::{build_filename, parse_name, parse_share_code, parse_valid_until};
use crate::helpers::{has_any, has_heading};
use crate::pages::{buttons, headings};

/// Final page: read the share code, save the PDF, produce the result.
pub struct Download;

impl Download {
    /// Summary capture first, then the details list, then the body text.
    async fn holder_name(ctx: &RunContext, body: &str) -> Option<String> {
        if let Some(name) = ctx.extracted.name() {
            return Some(name.to_string());
        }
        let cell = Locator::description_value("Name");
        if has_any(ctx.surface(), &cell).await {
            if let Ok(text) = ctx.surface().inner_text(&cell).await {
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }
        parse_name(body)
    }
}

async fn move_artifact(from: &Path, to: &Path) -> Result<(), FlowError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if tokio::fs::rename(from, to).await.is_err() {
        tokio::fs::copy(from, to).await?;
        if let Err(err) = tokio::fs::remove_file(from).await {
            warn!(path = %from.display(), %err, "failed to remove staged download");
        }
    }
    Ok(())
}

#[async_trait]
impl Step for Download {
    fn id(&self) -> &'static str {
        "download"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        has_heading(surface, wait, headings::DETAILS).await
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        let body = ctx.surface().inner_text(&Locator::Body).await?;
        let share_code = parse_share_code(&body).unwrap_or_default();
        if share_code.is_empty() {
            warn!("share code not found on details page");
        }
        let valid_until = parse_valid_until(&body);
        let name = Self::holder_name(ctx, &body).await;
        let target = ctx
            .options
            .artifact_target(&build_filename(name.as_deref(), valid_until));

        debug!(action = "download", detail = "pdf");
        ctx.wait
            .click_first_available(
                ctx.surface(),
                &[
                    Locator::link(TextMatch::contains(buttons::DOWNLOAD_PDF)),
                    Locator::css_with_text("a", buttons::DOWNLOAD_PDF),
                ],
            )
            .await?;
        let staged = ctx
            .surface()
            .await_download_artifact(ctx.wait.action_timeout())
            .await?;
        move_artifact(&staged, &target).await?;
        info!(path = %target.display(), %share_code, "share code PDF saved");

        ctx.set_result(RunResult {
            artifact_path: target,
            share_code,
            valid_until,
        })
    }
}
