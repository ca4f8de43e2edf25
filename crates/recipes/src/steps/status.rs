use action_flow::{FlowError, RunContext, Step};
use action_primitives::{Locator, Surface, TextMatch, WaitPolicy};
use async_trait::async_trait;
use tracing::debug;

use crate::helpers::{
    click_continue, dismiss_cookie_banner, dismiss_stay_signed_in, follow_first, has_any,
    has_heading,
};
use crate::pages::{buttons, headings, purpose_input_id, purpose_label, selectors};

/// Immigration status overview with the "Get a share code" link.
pub struct ProveStatus;

#[async_trait]
impl Step for ProveStatus {
    fn id(&self) -> &'static str {
        "prove-status"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        let heading = has_heading(surface, wait, headings::STATUS).await
            || has_heading(surface, wait, headings::PROVE_STATUS).await;
        if !heading {
            return false;
        }
        has_any(surface, &Locator::link(TextMatch::contains(buttons::GET_A_SHARE_CODE))).await
            || has_any(surface, &Locator::css(selectors::GET_SHARE_CODE_HREF)).await
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        dismiss_cookie_banner(ctx).await;
        dismiss_stay_signed_in(ctx).await;

        debug!(action = "click", detail = "get-share-code");
        follow_first(
            ctx,
            &[
                Locator::link(TextMatch::contains(buttons::GET_A_SHARE_CODE)),
                Locator::css_with_text(selectors::GOVUK_LINK_BUTTON, buttons::GET_A_SHARE_CODE),
                Locator::css(selectors::GET_SHARE_CODE_HREF),
            ],
        )
        .await
    }
}

/// Reason the share code is needed.
pub struct PurposeSelection;

#[async_trait]
impl Step for PurposeSelection {
    fn id(&self) -> &'static str {
        "purpose-selection"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        has_heading(surface, wait, headings::PURPOSE).await
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        let label = purpose_label(ctx.purpose);
        debug!(action = "check", detail = label);
        ctx.wait
            .check_first_available(
                ctx.surface(),
                &[
                    Locator::radio(TextMatch::exact(label)),
                    Locator::css(format!(
                        "input[name=\"listedPurpose\"]#{}",
                        purpose_input_id(ctx.purpose)
                    )),
                    Locator::css(format!("input[name=\"listedPurpose\"][value^=\"{label}\"]")),
                ],
            )
            .await?;
        click_continue(ctx).await
    }
}

/// Last page before the code is generated.
pub struct Confirmation;

#[async_trait]
impl Step for Confirmation {
    fn id(&self) -> &'static str {
        "confirmation"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        has_heading(surface, wait, headings::CONFIRMATION).await
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        dismiss_stay_signed_in(ctx).await;

        debug!(action = "click", detail = "get-share-code");
        follow_first(
            ctx,
            &[
                Locator::link(TextMatch::contains(buttons::GET_SHARE_CODE)),
                Locator::css_with_text(selectors::GOVUK_LINK_BUTTON, buttons::GET_SHARE_CODE),
                Locator::css(selectors::SHARE_HREF),
            ],
        )
        .await
    }
}
