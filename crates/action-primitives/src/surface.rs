use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{errors::ActionError, types::Locator};

/// Opaque handle to the page currently rendered in one automation session.
///
/// A surface is owned by whoever launched it and borrowed by a single flow run.
/// Implementations must tolerate the page navigating underneath them; queries
/// against a document that is being replaced may fail or return zero matches.
#[async_trait]
pub trait Surface: Send + Sync {
    /// Navigate to `url` and wait for the document to be interactive
    async fn goto(&self, url: &str) -> Result<(), ActionError>;

    /// Logical location of the rendered page (normally its URL)
    async fn current_identity(&self) -> String;

    /// Wait for any in-flight navigation to settle
    async fn wait_for_settled(&self) -> Result<(), ActionError>;

    /// Number of elements currently matching `locator`
    async fn count(&self, locator: &Locator) -> Result<usize, ActionError>;

    /// Whether the first match of `locator` is rendered
    async fn is_visible(&self, locator: &Locator) -> Result<bool, ActionError>;

    async fn click(&self, locator: &Locator) -> Result<(), ActionError>;

    /// Replace the value of the first matching form control
    async fn fill(&self, locator: &Locator, value: &str) -> Result<(), ActionError>;

    /// Tick the first matching radio or checkbox
    async fn check(&self, locator: &Locator) -> Result<(), ActionError>;

    /// Rendered text of the first match
    async fn inner_text(&self, locator: &Locator) -> Result<String, ActionError>;

    /// Full-page image bytes
    async fn capture_snapshot(&self) -> Result<Vec<u8>, ActionError>;

    /// Serialized document markup
    async fn capture_content(&self) -> Result<String, ActionError>;

    /// Block until a triggered download completes and return where it landed
    async fn await_download_artifact(&self, timeout: Duration) -> Result<PathBuf, ActionError>;

    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Release the session. Further calls may fail.
    async fn close(&self) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Creates one fresh, isolated surface per run.
#[async_trait]
pub trait SurfaceLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn Surface>, ActionError>;
}

#[async_trait]
impl<S> Surface for Arc<S>
where
    S: Surface + ?Sized,
{
    async fn goto(&self, url: &str) -> Result<(), ActionError> {
        (**self).goto(url).await
    }

    async fn current_identity(&self) -> String {
        (**self).current_identity().await
    }

    async fn wait_for_settled(&self) -> Result<(), ActionError> {
        (**self).wait_for_settled().await
    }

    async fn count(&self, locator: &Locator) -> Result<usize, ActionError> {
        (**self).count(locator).await
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, ActionError> {
        (**self).is_visible(locator).await
    }

    async fn click(&self, locator: &Locator) -> Result<(), ActionError> {
        (**self).click(locator).await
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<(), ActionError> {
        (**self).fill(locator, value).await
    }

    async fn check(&self, locator: &Locator) -> Result<(), ActionError> {
        (**self).check(locator).await
    }

    async fn inner_text(&self, locator: &Locator) -> Result<String, ActionError> {
        (**self).inner_text(locator).await
    }

    async fn capture_snapshot(&self) -> Result<Vec<u8>, ActionError> {
        (**self).capture_snapshot().await
    }

    async fn capture_content(&self) -> Result<String, ActionError> {
        (**self).capture_content().await
    }

    async fn await_download_artifact(&self, timeout: Duration) -> Result<PathBuf, ActionError> {
        (**self).await_download_artifact(timeout).await
    }

    async fn pause(&self, duration: Duration) {
        (**self).pause(duration).await
    }

    async fn close(&self) -> Result<(), ActionError> {
        (**self).close().await
    }
}
