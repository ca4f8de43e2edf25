use action_flow::{FlowError, RunContext, Step};
use action_primitives::{ElementState, Locator, Surface, TextMatch, WaitPolicy};
use async_trait::async_trait;
use tracing::debug;

use crate::helpers::{click_continue, has_heading};
use crate::pages::{
    document_number_heading, document_number_label, document_type_label, headings,
};

/// Chooses which identity document signs the holder in.
pub struct DocumentType;

#[async_trait]
impl Step for DocumentType {
    fn id(&self) -> &'static str {
        "document-type"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        has_heading(surface, wait, headings::DOCUMENT_TYPE).await
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        let label = document_type_label(ctx.credentials.auth.kind());
        debug!(action = "check", detail = label);
        ctx.surface()
            .check(&Locator::radio(TextMatch::contains(label)))
            .await?;
        click_continue(ctx).await
    }
}

/// One of four number pages, depending on the document chosen earlier.
pub struct DocumentNumber;

#[async_trait]
impl Step for DocumentNumber {
    fn id(&self) -> &'static str {
        "document-number"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        for heading in headings::DOCUMENT_NUMBERS {
            if has_heading(surface, wait, heading).await {
                return true;
            }
        }
        false
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        let kind = ctx.credentials.auth.kind();
        let label = document_number_label(kind);

        ctx.wait
            .wait_for(
                ctx.surface(),
                &Locator::heading(document_number_heading(kind)),
                ElementState::Visible,
                ctx.wait.action_timeout(),
            )
            .await?;

        debug!(action = "fill", detail = label);
        ctx.surface()
            .fill(
                &Locator::label(TextMatch::contains(label)),
                ctx.credentials.auth.number(),
            )
            .await?;
        click_continue(ctx).await
    }
}
