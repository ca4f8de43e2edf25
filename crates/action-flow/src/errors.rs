//! Flow execution error types

use std::path::PathBuf;

use action_primitives::ActionError;
use serde::Serialize;
use thiserror::Error;

/// Flow execution errors
#[derive(Debug, Error)]
pub enum FlowError {
    /// No step matched the current page, or the step bound was exceeded
    #[error("{message}")]
    Detection {
        message: String,
        /// Diagnostic snapshot captured when detection failed
        artifact: Option<PathBuf>,
    },

    /// Nobody supplied a security code before the deadline
    #[error("2FA timeout for {label}")]
    TwoFactorTimeout { label: String },

    /// A newer code request for the same requester replaced this one
    #[error("Superseded by new request")]
    Superseded,

    /// An expected element was absent or unusable
    #[error("Structural failure: {0}")]
    Structural(#[from] ActionError),

    /// Input rejected or the site reported a business-level problem
    #[error("{0}")]
    Domain(String),

    /// Local filesystem failure while handling artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable classification reported to users and in batch summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Detection,
    TwoFactorTimeout,
    Superseded,
    Structural,
    Domain,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Detection => "detection",
            ErrorKind::TwoFactorTimeout => "two_factor_timeout",
            ErrorKind::Superseded => "superseded",
            ErrorKind::Structural => "structural",
            ErrorKind::Domain => "domain",
            ErrorKind::Io => "io",
        }
    }
}

impl FlowError {
    pub fn detection(message: impl Into<String>) -> Self {
        FlowError::Detection {
            message: message.into(),
            artifact: None,
        }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        FlowError::Domain(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::Detection { .. } => ErrorKind::Detection,
            FlowError::TwoFactorTimeout { .. } => ErrorKind::TwoFactorTimeout,
            FlowError::Superseded => ErrorKind::Superseded,
            FlowError::Structural(_) => ErrorKind::Structural,
            FlowError::Domain(_) => ErrorKind::Domain,
            FlowError::Io(_) => ErrorKind::Io,
        }
    }

    /// Diagnostic artifact attached to the failure, if any.
    pub fn artifact(&self) -> Option<&PathBuf> {
        match self {
            FlowError::Detection { artifact, .. } => artifact.as_ref(),
            _ => None,
        }
    }

    /// Attach an artifact path; only detection failures carry one.
    pub fn with_artifact(self, path: Option<PathBuf>) -> Self {
        match self {
            FlowError::Detection { message, artifact } => FlowError::Detection {
                message,
                artifact: artifact.or(path),
            },
            other => other,
        }
    }
}
