use std::fmt;

use action_primitives::ActionError;
use chromiumoxide::error::CdpError;
use thiserror::Error;

/// High-level error categories surfaced by the adapter.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AdapterErrorKind {
    #[error("browser launch failed")]
    Launch,
    #[error("navigation timed out")]
    NavTimeout,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("target element not found")]
    TargetNotFound,
    #[error("element not interactable")]
    NotInteractable,
    #[error("download failed")]
    Download,
    #[error("internal error")]
    Internal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self { kind, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn detail(&self) -> String {
        self.hint.clone().unwrap_or_else(|| self.kind.to_string())
    }
}

impl From<CdpError> for AdapterError {
    fn from(err: CdpError) -> Self {
        AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string())
    }
}

impl From<AdapterError> for ActionError {
    fn from(err: AdapterError) -> Self {
        let detail = err.detail();
        match err.kind {
            AdapterErrorKind::NavTimeout => ActionError::NavTimeout(detail),
            AdapterErrorKind::Launch | AdapterErrorKind::CdpIo => ActionError::CdpIo(detail),
            AdapterErrorKind::TargetNotFound => ActionError::SelectorNotFound(detail),
            AdapterErrorKind::NotInteractable => ActionError::NotInteractable(detail),
            AdapterErrorKind::Download => ActionError::DownloadFailed(detail),
            AdapterErrorKind::Internal => ActionError::Internal(detail),
        }
    }
}
