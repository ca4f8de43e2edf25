use std::path::PathBuf;
use std::time::Duration;

use action_primitives::{ActionError, Locator, Surface};
use async_trait::async_trait;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::script::{self, Outcome, Query};

const PARTIAL_SUFFIX: &str = ".crdownload";

/// One browser process and the single page a run drives.
pub struct ChromiumSurface {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    downloads: TempDir,
    // Held so a throwaway profile outlives the browser using it.
    _profile: Option<TempDir>,
    cfg: CdpConfig,
}

impl ChromiumSurface {
    pub(crate) fn new(
        browser: Browser,
        handler: JoinHandle<()>,
        page: Page,
        downloads: TempDir,
        profile: Option<TempDir>,
        cfg: CdpConfig,
    ) -> Self {
        Self {
            page,
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handler)),
            downloads,
            _profile: profile,
            cfg,
        }
    }

    /// Directory the browser saves downloads into before they are moved.
    pub fn download_dir(&self) -> &std::path::Path {
        self.downloads.path()
    }

    async fn eval<T: DeserializeOwned>(&self, expression: String) -> Result<T, AdapterError> {
        let result = timeout(self.cfg.nav_timeout(), self.page.evaluate(expression))
            .await
            .map_err(|_| {
                AdapterError::new(AdapterErrorKind::NavTimeout).with_hint("script evaluation")
            })??;
        result.into_value::<T>().map_err(|err| {
            AdapterError::new(AdapterErrorKind::CdpIo).with_hint(format!("decode result: {err}"))
        })
    }

    async fn query<T: DeserializeOwned>(
        &self,
        locator: &Locator,
        query: Query<'_>,
    ) -> Result<T, AdapterError> {
        self.eval(script::build(locator, query)?).await
    }

    async fn act(&self, locator: &Locator, query: Query<'_>) -> Result<Option<String>, AdapterError> {
        let outcome: Outcome = self.query(locator, query).await?;
        outcome.into_result(locator)
    }

    /// First completed file in the download directory, if any.
    async fn completed_download(&self) -> Option<(PathBuf, u64)> {
        let mut entries = tokio::fs::read_dir(self.downloads.path()).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(PARTIAL_SUFFIX) || name.starts_with('.') {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                if meta.is_file() && meta.len() > 0 {
                    return Some((entry.path(), meta.len()));
                }
            }
        }
        None
    }
}

#[async_trait]
impl Surface for ChromiumSurface {
    async fn goto(&self, url: &str) -> Result<(), ActionError> {
        debug!(%url, "navigate");
        match timeout(self.cfg.nav_timeout(), self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(AdapterError::from(err).into()),
            Err(_) => Err(ActionError::NavTimeout(url.to_string())),
        }
    }

    async fn current_identity(&self) -> String {
        match self.eval::<String>("location.href".to_string()).await {
            Ok(href) => href,
            Err(_) => self.page.url().await.ok().flatten().unwrap_or_default(),
        }
    }

    async fn wait_for_settled(&self) -> Result<(), ActionError> {
        sleep(self.cfg.settle_delay()).await;
        let deadline = Instant::now() + self.cfg.nav_timeout();
        loop {
            // Evaluation fails while the old document is being torn down.
            if let Ok(state) = self.eval::<String>("document.readyState".to_string()).await {
                if state == "complete" {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(ActionError::NavTimeout("page did not settle".into()));
            }
            sleep(self.cfg.poll_interval()).await;
        }
    }

    async fn count(&self, locator: &Locator) -> Result<usize, ActionError> {
        Ok(self.query::<usize>(locator, Query::Count).await?)
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, ActionError> {
        Ok(self.query::<bool>(locator, Query::Visible).await?)
    }

    async fn click(&self, locator: &Locator) -> Result<(), ActionError> {
        self.act(locator, Query::Click).await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<(), ActionError> {
        self.act(locator, Query::Fill(value)).await?;
        Ok(())
    }

    async fn check(&self, locator: &Locator) -> Result<(), ActionError> {
        self.act(locator, Query::Check).await?;
        Ok(())
    }

    async fn inner_text(&self, locator: &Locator) -> Result<String, ActionError> {
        Ok(self
            .act(locator, Query::InnerText)
            .await?
            .unwrap_or_default())
    }

    async fn capture_snapshot(&self) -> Result<Vec<u8>, ActionError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page
            .screenshot(params)
            .await
            .map_err(|err| AdapterError::from(err).into())
    }

    async fn capture_content(&self) -> Result<String, ActionError> {
        self.page
            .content()
            .await
            .map_err(|err| AdapterError::from(err).into())
    }

    async fn await_download_artifact(&self, wait: Duration) -> Result<PathBuf, ActionError> {
        let deadline = Instant::now() + wait;
        let mut last_seen: Option<(PathBuf, u64)> = None;
        loop {
            let current = self.completed_download().await;
            // Same file and size on two consecutive polls counts as finished.
            if let (Some(now), Some(before)) = (&current, &last_seen) {
                if now == before {
                    debug!(path = %now.0.display(), bytes = now.1, "download complete");
                    return Ok(now.0.clone());
                }
            }
            if Instant::now() >= deadline {
                return Err(AdapterError::new(AdapterErrorKind::Download)
                    .with_hint(format!("no completed download within {}ms", wait.as_millis()))
                    .into());
            }
            last_seen = current;
            sleep(self.cfg.poll_interval()).await;
        }
    }

    async fn close(&self) -> Result<(), ActionError> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(err) = browser.close().await {
                warn!(%err, "browser close failed");
            }
            if let Err(err) = browser.wait().await {
                warn!(%err, "browser did not exit cleanly");
            }
        }
        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }
        Ok(())
    }
}
