use action_flow::{FlowError, RunContext, Step};
use action_primitives::{Locator, Surface, TextMatch, WaitPolicy};
use async_trait::async_trait;
use tracing::debug;

use crate::helpers::{
    dismiss_cookie_banner, dismiss_stay_signed_in, follow_first, has_any, has_heading,
};
use crate::pages::{buttons, headings, selectors};

/// What the holder can do in the UK; also the first place their name shows.
pub struct Summary;

impl Summary {
    async fn capture_name(ctx: &mut RunContext) {
        if ctx.extracted.name().is_some() {
            return;
        }
        let cell = Locator::description_value("Name");
        if !has_any(ctx.surface(), &cell).await {
            return;
        }
        match ctx.surface().inner_text(&cell).await {
            Ok(name) => {
                if ctx.extracted.record_name(name) {
                    debug!(name = ?ctx.extracted.name(), "captured holder name");
                }
            }
            Err(err) => debug!(%err, "holder name unavailable"),
        }
    }
}

#[async_trait]
impl Step for Summary {
    fn id(&self) -> &'static str {
        "summary"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        has_heading(surface, wait, headings::SUMMARY).await
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        dismiss_stay_signed_in(ctx).await;
        dismiss_cookie_banner(ctx).await;
        Self::capture_name(ctx).await;

        debug!(action = "click", detail = "create-share-code");
        follow_first(
            ctx,
            &[
                Locator::link(TextMatch::contains(buttons::CREATE_SHARE_CODE)),
                Locator::css_with_text(selectors::GOVUK_LINK_BUTTON, buttons::CREATE_SHARE_CODE),
                Locator::css(selectors::CREATE_CODE_HREF),
            ],
        )
        .await
    }
}
