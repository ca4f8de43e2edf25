use action_flow::{FlowError, RunContext, Step};
use action_primitives::{Locator, Surface, TextMatch, WaitPolicy};
use async_trait::async_trait;
use sharecode_core_types::TwoFactorMethod;
use tracing::{debug, info};

use crate::helpers::{click_continue, has_any, has_heading};
use crate::pages::{headings, selectors};

fn method_radio(method: TwoFactorMethod) -> Locator {
    match method {
        TwoFactorMethod::Sms => Locator::radio(TextMatch::contains("text message")),
        TwoFactorMethod::Email => Locator::radio(TextMatch::contains("email")),
    }
}

/// Picks how the security code is delivered.
pub struct TwoFactorMethodChoice;

#[async_trait]
impl Step for TwoFactorMethodChoice {
    fn id(&self) -> &'static str {
        "two-factor-method"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        has_heading(surface, wait, headings::TWO_FACTOR_METHOD).await
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        let mut order = vec![TwoFactorMethod::Sms, TwoFactorMethod::Email];
        if let Some(preferred) = ctx.credentials.preferred_two_factor {
            order.retain(|m| *m != preferred);
            order.insert(0, preferred);
        }

        for method in order {
            let radio = method_radio(method);
            if has_any(ctx.surface(), &radio).await {
                debug!(action = "check", detail = %method);
                ctx.surface().check(&radio).await?;
                break;
            }
        }
        click_continue(ctx).await
    }
}

/// Waits for the human-supplied security code and submits it.
pub struct TwoFactorCode;

impl TwoFactorCode {
    async fn infer_method(surface: &dyn Surface) -> TwoFactorMethod {
        if has_any(surface, &Locator::heading(headings::CODE_PHONE)).await {
            TwoFactorMethod::Sms
        } else if has_any(surface, &Locator::heading(headings::CODE_EMAIL)).await {
            TwoFactorMethod::Email
        } else {
            TwoFactorMethod::Sms
        }
    }
}

#[async_trait]
impl Step for TwoFactorCode {
    fn id(&self) -> &'static str {
        "two-factor-code"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        let field = Locator::label(TextMatch::contains(selectors::SECURITY_CODE_LABEL));
        has_any(surface, &field).await
            && (has_heading(surface, wait, headings::CODE_PHONE).await
                || has_heading(surface, wait, headings::CODE_EMAIL).await)
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        let method = Self::infer_method(ctx.surface()).await;
        let code = ctx.request_code(method).await?;
        info!(%method, "security code received");

        debug!(action = "fill", detail = "security-code");
        ctx.surface()
            .fill(
                &Locator::label(TextMatch::contains(selectors::SECURITY_CODE_LABEL)),
                code.trim(),
            )
            .await?;
        click_continue(ctx).await
    }
}
