//! Page detection robust to navigation mid-scan

use std::sync::Arc;

use action_primitives::{Surface, WaitPolicy};
use tracing::{debug, warn};

use crate::step::{Step, StepCatalog};

/// Outcome of one detection pass.
pub enum Detection {
    /// First catalog-order step whose `detect` held on a stable page
    Matched(Arc<dyn Step>),
    /// A full scan completed on a stable page and nothing matched
    NoMatch,
    /// The page kept moving on every permitted scan
    Unsettled { attempts: usize },
}

impl Detection {
    pub fn matched(&self) -> Option<&Arc<dyn Step>> {
        match self {
            Detection::Matched(step) => Some(step),
            _ => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Detection::Matched(_))
    }
}

impl std::fmt::Debug for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detection::Matched(step) => write!(f, "Matched({})", step.id()),
            Detection::NoMatch => f.write_str("NoMatch"),
            Detection::Unsettled { attempts } => write!(f, "Unsettled({attempts})"),
        }
    }
}

/// Selects the step matching the rendered page.
#[derive(Debug, Clone, Copy)]
pub struct StepDetector {
    max_retries: usize,
}

impl Default for StepDetector {
    fn default() -> Self {
        Self { max_retries: 2 }
    }
}

impl StepDetector {
    pub fn new(max_retries: usize) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Scan `catalog` in order against `surface`.
    ///
    /// The surface identity is sampled before the scan and after every
    /// `detect`. A change abandons the scan (discarding any hit, which may
    /// describe the page that just left) and starts over, at most
    /// `max_retries` extra times.
    pub async fn detect(
        &self,
        catalog: &StepCatalog,
        surface: &dyn Surface,
        wait: &WaitPolicy,
    ) -> Detection {
        let attempts = self.max_retries + 1;
        for attempt in 1..=attempts {
            let before = surface.current_identity().await;
            let mut moved = false;

            for step in catalog.iter() {
                let hit = step.detect(surface, wait).await;
                let now = surface.current_identity().await;
                if now != before {
                    debug!(attempt, from = %before, to = %now, step = step.id(), "page moved during detection");
                    moved = true;
                    break;
                }
                if hit {
                    debug!(attempt, step = step.id(), "page detected");
                    return Detection::Matched(Arc::clone(step));
                }
            }

            if !moved {
                return Detection::NoMatch;
            }
            if let Err(err) = surface.wait_for_settled().await {
                debug!(%err, "settle wait failed before rescan");
            }
        }

        warn!(attempts, "page never settled during detection");
        Detection::Unsettled { attempts }
    }
}
