//! Bounded waiting built on top of [`Surface`] queries

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::{
    errors::ActionError,
    surface::Surface,
    types::{ElementState, Locator},
};

/// Timeouts applied when polling a surface for elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between successive queries (milliseconds)
    pub poll_interval_ms: u64,

    /// Upper bound for presence probes used during detection (milliseconds)
    pub presence_timeout_ms: u64,

    /// Upper bound for waits that precede an action (milliseconds)
    pub action_timeout_ms: u64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            presence_timeout_ms: 2_000,
            action_timeout_ms: 30_000,
        }
    }
}

impl WaitPolicy {
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_presence_timeout(mut self, timeout: Duration) -> Self {
        self.presence_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    pub fn presence_timeout(&self) -> Duration {
        Duration::from_millis(self.presence_timeout_ms)
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Poll until `locator` reaches `state` or `timeout` elapses.
    ///
    /// Query errors while polling are treated as "not yet": the document may
    /// be mid-navigation. On expiry the error distinguishes an absent element
    /// from one that is attached but never became visible.
    pub async fn wait_for(
        &self,
        surface: &dyn Surface,
        locator: &Locator,
        state: ElementState,
        timeout: Duration,
    ) -> Result<(), ActionError> {
        let deadline = Instant::now() + timeout;
        let mut attached = false;
        loop {
            match surface.count(locator).await {
                Ok(n) if n > 0 => {
                    attached = true;
                    if state == ElementState::Attached {
                        return Ok(());
                    }
                    match surface.is_visible(locator).await {
                        Ok(true) => return Ok(()),
                        Ok(false) => trace!(%locator, "attached but hidden"),
                        Err(err) => trace!(%locator, %err, "visibility probe failed"),
                    }
                }
                Ok(_) => attached = false,
                Err(err) => trace!(%locator, %err, "query failed while waiting"),
            }

            if Instant::now() >= deadline {
                let waited = timeout.as_millis();
                return Err(if attached {
                    ActionError::NotInteractable(format!("{locator} not visible after {waited}ms"))
                } else {
                    ActionError::SelectorNotFound(format!("{locator} (waited {waited}ms)"))
                });
            }
            surface.pause(self.poll_interval()).await;
        }
    }

    /// Side-effect free presence probe: waits up to the presence timeout for
    /// an attached match, then reports whether one exists.
    pub async fn is_present(&self, surface: &dyn Surface, locator: &Locator) -> bool {
        if self
            .wait_for(surface, locator, ElementState::Attached, self.presence_timeout())
            .await
            .is_err()
        {
            return false;
        }
        matches!(surface.count(locator).await, Ok(n) if n > 0)
    }

    /// Wait for the element to become visible, then click it.
    pub async fn click_when_visible(
        &self,
        surface: &dyn Surface,
        locator: &Locator,
    ) -> Result<(), ActionError> {
        self.wait_for(surface, locator, ElementState::Visible, self.action_timeout())
            .await?;
        debug!(action = "click", detail = %locator);
        surface.click(locator).await
    }

    /// Click the first candidate that currently has a match. When none match,
    /// the last candidate is clicked anyway so the caller gets its structural
    /// error.
    pub async fn click_first_available(
        &self,
        surface: &dyn Surface,
        candidates: &[Locator],
    ) -> Result<(), ActionError> {
        for candidate in candidates {
            if matches!(surface.count(candidate).await, Ok(n) if n > 0) {
                debug!(action = "click", detail = %candidate);
                return surface.click(candidate).await;
            }
        }
        match candidates.last() {
            Some(last) => self.click_when_visible(surface, last).await,
            None => Err(ActionError::Internal("no click candidates supplied".into())),
        }
    }

    /// Tick the first candidate that currently has a match, falling back to
    /// the last candidate like [`click_first_available`](Self::click_first_available).
    pub async fn check_first_available(
        &self,
        surface: &dyn Surface,
        candidates: &[Locator],
    ) -> Result<(), ActionError> {
        for candidate in candidates {
            if matches!(surface.count(candidate).await, Ok(n) if n > 0) {
                debug!(action = "check", detail = %candidate);
                return surface.check(candidate).await;
            }
        }
        match candidates.last() {
            Some(last) => {
                self.wait_for(surface, last, ElementState::Attached, self.action_timeout())
                    .await?;
                surface.check(last).await
            }
            None => Err(ActionError::Internal("no check candidates supplied".into())),
        }
    }
}
