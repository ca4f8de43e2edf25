//! Page automation primitives
//!
//! This crate provides the capability boundary between flow logic and a live page:
//! - The [`Surface`] trait: navigation, identity, element queries and actions,
//!   diagnostic capture and download artifacts
//! - A small query vocabulary ([`Locator`], [`Role`], [`TextMatch`])
//! - Bounded waiting helpers used by detection and execution
//! - Structural error reporting via [`ActionError`]

pub mod errors;
mod surface;
pub mod types;
mod waiting;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use errors::*;
pub use surface::*;
pub use types::*;
pub use waiting::*;
