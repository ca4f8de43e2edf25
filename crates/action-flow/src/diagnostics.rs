//! Best-effort page diagnostics

use std::path::{Path, PathBuf};

use action_primitives::Surface;
use tracing::{debug, warn};

/// Files written by one [`capture_debug`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticArtifact {
    pub snapshot: Option<PathBuf>,
    pub content: Option<PathBuf>,
}

impl DiagnosticArtifact {
    /// Path reported to users: the snapshot if one was written, else the markup dump.
    pub fn primary(&self) -> Option<PathBuf> {
        self.snapshot.clone().or_else(|| self.content.clone())
    }
}

/// Replace anything outside `[A-Za-z0-9_-]` so labels are safe filenames.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write `<dir>/<label>.png` and `<dir>/<label>.html` from the surface.
///
/// Failures are logged and swallowed; the returned record lists only the
/// files that were actually written.
pub async fn capture_debug(surface: &dyn Surface, dir: &Path, label: &str) -> DiagnosticArtifact {
    let mut artifact = DiagnosticArtifact::default();
    if let Err(err) = tokio::fs::create_dir_all(dir).await {
        warn!(dir = %dir.display(), %err, "failed to create diagnostics directory");
        return artifact;
    }

    let safe = sanitize_label(label);
    let snapshot_path = dir.join(format!("{safe}.png"));
    let content_path = dir.join(format!("{safe}.html"));

    match surface.capture_snapshot().await {
        Ok(bytes) => match tokio::fs::write(&snapshot_path, bytes).await {
            Ok(()) => {
                debug!(path = %snapshot_path.display(), "captured snapshot");
                artifact.snapshot = Some(snapshot_path);
            }
            Err(err) => warn!(%err, "failed to write snapshot"),
        },
        Err(err) => warn!(%err, "failed to capture snapshot"),
    }

    match surface.capture_content().await {
        Ok(html) => match tokio::fs::write(&content_path, html).await {
            Ok(()) => {
                debug!(path = %content_path.display(), "captured page content");
                artifact.content = Some(content_path);
            }
            Err(err) => warn!(%err, "failed to write page content"),
        },
        Err(err) => warn!(%err, "failed to capture page content"),
    }

    artifact
}
