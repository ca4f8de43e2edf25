use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_primitives::{ActionError, Surface, SurfaceLauncher};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CdpConfig;
use crate::detect::detect_chrome_executable;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::surface::ChromiumSurface;

const ARGS: &[&str] = &[
    "--disable-background-networking",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-update",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-popup-blocking",
    "--disable-sync",
    "--no-first-run",
    "--no-default-browser-check",
    "--password-store=basic",
    "--use-mock-keychain",
];

/// Starts one browser per run.
#[derive(Clone, Debug, Default)]
pub struct ChromiumLauncher {
    cfg: CdpConfig,
}

impl ChromiumLauncher {
    pub fn new(cfg: CdpConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CdpConfig {
        &self.cfg
    }

    fn executable(&self) -> Result<Option<PathBuf>, AdapterError> {
        match &self.cfg.executable {
            Some(path) if path.exists() => Ok(Some(path.clone())),
            Some(path) => Err(AdapterError::new(AdapterErrorKind::Launch).with_hint(format!(
                "chrome executable not found at {}",
                path.display()
            ))),
            None => Ok(detect_chrome_executable()),
        }
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig, AdapterError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.cfg.nav_timeout())
            .launch_timeout(self.cfg.launch_timeout())
            .user_data_dir(profile_dir);

        if !self.cfg.headless {
            builder = builder.with_head();
        }
        if self.cfg.no_sandbox {
            builder = builder.no_sandbox();
        }

        let mut args: Vec<&str> = ARGS.to_vec();
        if self.cfg.headless {
            args.push("--headless=new");
            args.push("--hide-scrollbars");
            args.push("--mute-audio");
        }
        builder = builder.args(args);

        if let Some(executable) = self.executable()? {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("browser config error: {err}"))
        })
    }

    /// Persistent profile when configured, otherwise a fresh temporary one.
    fn profile(&self) -> Result<(PathBuf, Option<TempDir>), AdapterError> {
        match &self.cfg.user_data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|err| {
                    AdapterError::new(AdapterErrorKind::Launch)
                        .with_hint(format!("failed to ensure user-data-dir: {err}"))
                })?;
                Ok((dir.clone(), None))
            }
            None => {
                let dir = temp_dir("sharecode-profile-")?;
                Ok((dir.path().to_path_buf(), Some(dir)))
            }
        }
    }

    pub async fn launch_surface(&self) -> Result<ChromiumSurface, AdapterError> {
        let (profile_dir, profile_guard) = self.profile()?;
        let downloads = temp_dir("sharecode-downloads-")?;
        let config = self.browser_config(&profile_dir)?;

        let (mut browser, mut handler) = Browser::launch(config).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch).with_hint(err.to_string())
        })?;
        let handler_task: JoinHandle<()> = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(%err, "cdp handler event error");
                }
            }
        });

        match prepare_page(&browser, downloads.path()).await {
            Ok(page) => {
                info!(
                    profile = %profile_dir.display(),
                    persistent = profile_guard.is_none(),
                    headless = self.cfg.headless,
                    "browser launched"
                );
                Ok(ChromiumSurface::new(
                    browser,
                    handler_task,
                    page,
                    downloads,
                    profile_guard,
                    self.cfg.clone(),
                ))
            }
            Err(err) => {
                if let Err(close_err) = browser.close().await {
                    warn!(%close_err, "failed to close browser after setup error");
                }
                handler_task.abort();
                Err(err)
            }
        }
    }
}

async fn prepare_page(
    browser: &Browser,
    download_dir: &Path,
) -> Result<chromiumoxide::Page, AdapterError> {
    let page = browser.new_page("about:blank").await?;
    let params = SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::Allow)
        .download_path(download_dir.to_string_lossy().to_string())
        .build()
        .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))?;
    browser.execute(params).await?;
    Ok(page)
}

fn temp_dir(prefix: &str) -> Result<TempDir, AdapterError> {
    tempfile::Builder::new().prefix(prefix).tempdir().map_err(|err| {
        AdapterError::new(AdapterErrorKind::Launch).with_hint(format!("temp dir: {err}"))
    })
}

#[async_trait]
impl SurfaceLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn Surface>, ActionError> {
        let surface = self.launch_surface().await?;
        Ok(Arc::new(surface))
    }
}
