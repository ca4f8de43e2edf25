//! Chromium-backed [`Surface`](action_primitives::Surface)
//!
//! One [`ChromiumLauncher::launch`](action_primitives::SurfaceLauncher::launch)
//! call starts a browser process with its own profile (or the configured
//! persistent one) and a private download directory. Element queries are
//! answered by a small in-page resolver evaluated over CDP.

pub mod config;
mod detect;
pub mod error;
mod launcher;
mod script;
mod surface;

pub use config::CdpConfig;
pub use detect::detect_chrome_executable;
pub use error::{AdapterError, AdapterErrorKind};
pub use launcher::ChromiumLauncher;
pub use surface::ChromiumSurface;
