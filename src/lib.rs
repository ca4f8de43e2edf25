//! ShareCode library
//!
//! Configuration, requester profiles and the runner that ties a browser
//! launcher, the flow engine and the security-code exchange together.
//! Exposed for integration testing.

pub mod cli;
pub mod config;
pub mod profile;
pub mod runner;

pub use config::AppConfig;
pub use profile::{load_profiles, parse_profiles, Profile};
pub use runner::{submit_candidate, FailureReport, RunFailure, RunRequest, SessionRunner};
