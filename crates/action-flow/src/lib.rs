//! Flow Orchestration Layer
//!
//! This crate drives a multi-page flow whose current page can only be
//! inferred from what is rendered:
//! - [`Step`] and [`StepCatalog`]: ordered detect/execute units, one per page
//! - [`StepDetector`]: catalog scan that restarts when the page moves mid-scan
//! - [`FlowEngine`]: bounded detect/execute loop with diagnostic capture
//! - [`RunContext`]: per-run state, including the write-once result slot and
//!   the security-code provider

pub mod context;
pub mod detector;
pub mod diagnostics;
pub mod errors;
pub mod executor;
pub mod step;
pub mod types;

pub use context::{CodeProvider, NoCodeProvider, RunContext};
pub use detector::{Detection, StepDetector};
pub use diagnostics::{capture_debug, sanitize_label, DiagnosticArtifact};
pub use errors::{ErrorKind, FlowError};
pub use executor::FlowEngine;
pub use step::{Step, StepCatalog};
pub use types::{ExtractedData, RunOptions};
