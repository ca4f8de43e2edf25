//! Step contract and the ordered catalog detection scans

use std::collections::HashSet;
use std::sync::Arc;

use action_primitives::{Surface, WaitPolicy};
use async_trait::async_trait;

use crate::context::RunContext;
use crate::errors::FlowError;

/// One page of the flow.
///
/// `detect` must not change page state; it may only wait (bounded) to decide
/// whether an element is present. `execute` is the single side-effecting
/// entry point and is never retried by the step itself.
#[async_trait]
pub trait Step: Send + Sync {
    /// Identifier, unique within a catalog
    fn id(&self) -> &'static str;

    /// Whether the surface currently shows this step's page
    async fn detect(&self, surface: &dyn Surface, wait: &WaitPolicy) -> bool;

    /// Drive the page forward
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError>;
}

/// Immutable, ordered set of steps. Order is the tie-break when several
/// steps detect at once.
#[derive(Clone, Default)]
pub struct StepCatalog {
    steps: Vec<Arc<dyn Step>>,
}

impl StepCatalog {
    /// Build a catalog, rejecting duplicate ids.
    pub fn new(steps: Vec<Arc<dyn Step>>) -> Result<Self, FlowError> {
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id()) {
                return Err(FlowError::domain(format!(
                    "duplicate step id `{}` in catalog",
                    step.id()
                )));
            }
        }
        Ok(Self { steps })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Step>> {
        self.steps.iter()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Step>> {
        self.steps.iter().find(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for StepCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
