//! Share-code flow recipes
//!
//! The concrete page catalog driven by [`action_flow::FlowEngine`]: one
//! [`Step`](action_flow::Step) per page, the visible text each one keys on,
//! and the extraction rules for the final details page.

pub mod extract;
pub mod helpers;
pub mod pages;
pub mod steps;

use std::sync::Arc;

use action_flow::{FlowError, Step, StepCatalog};

/// Public start page of the service.
pub const DEFAULT_START_URL: &str = "https://www.gov.uk/evisa/view-evisa-get-share-code-prove-immigration-status";

/// All steps in detection order. Earlier entries win when several pages
/// would match at once.
pub fn default_steps() -> Vec<Arc<dyn Step>> {
    vec![
        Arc::new(steps::EntryPage),
        Arc::new(steps::DocumentType),
        Arc::new(steps::DocumentNumber),
        Arc::new(steps::DateOfBirthPage),
        Arc::new(steps::TwoFactorMethodChoice),
        Arc::new(steps::TwoFactorCode),
        Arc::new(steps::ProveStatus),
        Arc::new(steps::PurposeSelection),
        Arc::new(steps::Confirmation),
        Arc::new(steps::Summary),
        Arc::new(steps::Download),
    ]
}

pub fn default_catalog() -> Result<StepCatalog, FlowError> {
    StepCatalog::new(default_steps())
}
