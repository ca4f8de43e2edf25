//! Interactions shared by several steps

use std::time::Duration;

use action_flow::{FlowError, RunContext};
use action_primitives::{Locator, Surface, TextMatch, WaitPolicy};
use tracing::debug;

use crate::pages::buttons;

pub async fn has_heading(surface: &dyn Surface, wait: &WaitPolicy, text: &str) -> bool {
    wait.is_present(surface, &Locator::heading(text)).await
}

pub async fn has_any(surface: &dyn Surface, locator: &Locator) -> bool {
    matches!(surface.count(locator).await, Ok(n) if n > 0)
}

/// Click `Continue` and wait for the next document.
pub async fn click_continue(ctx: &RunContext) -> Result<(), FlowError> {
    ctx.wait
        .click_when_visible(
            ctx.surface(),
            &Locator::button(TextMatch::exact(buttons::CONTINUE)),
        )
        .await?;
    ctx.surface().wait_for_settled().await?;
    Ok(())
}

/// Click the first candidate that exists, then wait for navigation.
pub async fn follow_first(ctx: &RunContext, candidates: &[Locator]) -> Result<(), FlowError> {
    ctx.wait
        .click_first_available(ctx.surface(), candidates)
        .await?;
    ctx.surface().wait_for_settled().await?;
    Ok(())
}

/// Click `button` if it is currently rendered. Failures are ignored.
async fn click_if_present(ctx: &RunContext, name: &str, detail: &str) -> bool {
    let locator = Locator::button(TextMatch::contains(name));
    if !has_any(ctx.surface(), &locator).await {
        return false;
    }
    debug!(action = "click", detail);
    match ctx.surface().click(&locator).await {
        Ok(()) => true,
        Err(err) => {
            debug!(%err, detail, "optional click failed");
            false
        }
    }
}

/// Dismiss the session keep-alive dialog if it is showing.
pub async fn dismiss_stay_signed_in(ctx: &RunContext) {
    click_if_present(ctx, buttons::STAY_SIGNED_IN, "stay-signed-in").await;
}

/// Answer the analytics cookie banner if it is showing.
pub async fn dismiss_cookie_banner(ctx: &RunContext) {
    if !click_if_present(ctx, buttons::ACCEPT_ANALYTICS, "accept-analytics-cookies").await {
        click_if_present(ctx, buttons::REJECT_ANALYTICS, "reject-analytics-cookies").await;
    }
}

/// Accept the landing page cookie banner if it is showing.
pub async fn accept_additional_cookies(ctx: &RunContext) {
    if click_if_present(ctx, buttons::ACCEPT_ADDITIONAL_COOKIES, "accept-cookies").await {
        ctx.surface().pause(Duration::from_millis(500)).await;
    }
}
