use action_flow::{FlowError, RunContext, Step};
use action_primitives::{Locator, Surface, TextMatch, WaitPolicy};
use async_trait::async_trait;
use tracing::debug;

use crate::helpers::{click_continue, has_heading};
use crate::pages::headings;

pub struct DateOfBirthPage;

#[async_trait]
impl Step for DateOfBirthPage {
    fn id(&self) -> &'static str {
        "date-of-birth"
    }

    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool {
        has_heading(surface, wait, headings::DATE_OF_BIRTH).await
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
        let dob = ctx.credentials.date_of_birth;
        debug!(action = "fill", detail = "date-of-birth");
        for (label, value) in [
            ("Day", dob.day.to_string()),
            ("Month", dob.month.to_string()),
            ("Year", dob.year.to_string()),
        ] {
            ctx.surface()
                .fill(&Locator::label(TextMatch::exact(label)), &value)
                .await?;
        }
        click_continue(ctx).await
    }
}
