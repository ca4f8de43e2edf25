//! Error types for surface operations

use thiserror::Error;

/// Failures raised by a [`Surface`](crate::Surface) implementation.
///
/// Everything here is structural from the flow's point of view: the page did
/// not contain what a step expected, or the automation channel broke.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Navigation timed out waiting for page load
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// Wait operation timed out
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// No element matched the locator
    #[error("Selector not found: {0}")]
    SelectorNotFound(String),

    /// Element exists but cannot be interacted with
    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    /// Page identity changed while an operation was in flight
    #[error("Stale page: {0}")]
    StalePage(String),

    /// Download never produced a completed artifact
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Browser protocol or transport error
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Check if the underlying condition may clear on its own
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ActionError::WaitTimeout(_) | ActionError::StalePage(_) | ActionError::CdpIo(_)
        )
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) => 3,
            ActionError::NavTimeout(_) | ActionError::CdpIo(_) | ActionError::DownloadFailed(_) => 2,
            ActionError::WaitTimeout(_)
            | ActionError::SelectorNotFound(_)
            | ActionError::NotInteractable(_) => 1,
            ActionError::StalePage(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_classified() {
        assert!(ActionError::WaitTimeout("x".into()).is_transient());
        assert!(!ActionError::SelectorNotFound("x".into()).is_transient());
    }

    #[test]
    fn severity_orders_internal_highest() {
        assert_eq!(ActionError::Internal("x".into()).severity(), 3);
        assert!(
            ActionError::CdpIo("x".into()).severity()
                > ActionError::SelectorNotFound("x".into()).severity()
        );
    }
}
