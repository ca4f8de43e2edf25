use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for launching browsers and pacing page interaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    /// Chrome/Chromium binary; detected when unset
    pub executable: Option<PathBuf>,
    /// Persistent profile directory; a throwaway profile is used when unset
    pub user_data_dir: Option<PathBuf>,
    pub headless: bool,
    pub no_sandbox: bool,
    pub nav_timeout_ms: u64,
    pub launch_timeout_ms: u64,
    /// Grace period after an action before polling for the next document
    pub settle_delay_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: None,
            user_data_dir: None,
            headless: resolve_headless_default(),
            no_sandbox: env_flag("SHARECODE_DISABLE_SANDBOX"),
            nav_timeout_ms: 30_000,
            launch_timeout_ms: 20_000,
            settle_delay_ms: 150,
            poll_interval_ms: 200,
        }
    }
}

impl CdpConfig {
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.nav_timeout_ms)
    }

    pub fn launch_timeout(&self) -> Duration {
        Duration::from_millis(self.launch_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

fn resolve_headless_default() -> bool {
    // "0", "false", "no", "off" mean headful
    match env::var("SHARECODE_HEADLESS") {
        Ok(value) => {
            let lower = value.to_ascii_lowercase();
            !matches!(lower.as_str(), "0" | "false" | "no" | "off")
        }
        Err(_) => true,
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
