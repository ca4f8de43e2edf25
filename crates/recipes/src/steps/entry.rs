use action_flow::{FlowError, RunContext, Step};
use action_primitives::{Locator, Surface, TextMatch, WaitPolicy};
use async_trait::async_trait;
use tracing::debug;

use crate::helpers::{accept_additional_cookies, follow_first, has_heading};
use crate::pages::{headings, selectors};

/// Landing page with the start link.
pub struct EntryPage;

#[async_trait]
impl Step for EntryPage {
    fn id(&self) -> &'static str {
        "entry-page"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        has_heading(surface, wait, headings::ENTRY).await
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        accept_additional_cookies(ctx).await;

        debug!(action = "click", detail = "entry-start");
        follow_first(
            ctx,
            &[
                Locator::link(TextMatch::contains(headings::ENTRY)),
                Locator::css(selectors::ENTRY_HREF),
                Locator::css_with_text("a", headings::ENTRY),
            ],
        )
        .await
    }
}
