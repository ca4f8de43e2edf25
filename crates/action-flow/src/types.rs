//! Run-scoped options and scratch state

use std::path::PathBuf;
use std::time::Duration;

/// Knobs that shape one flow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Capture a snapshot before executing every step
    pub capture_steps: bool,

    /// Capture diagnostics when the run fails
    pub screenshot_on_error: bool,

    /// Directory for artifacts; diagnostics go to `<output_dir>/debug`
    pub output_dir: PathBuf,

    /// Explicit artifact path; relative paths resolve under `output_dir`
    pub output_file: Option<PathBuf>,

    /// How long a run waits for a human-supplied security code
    pub two_factor_timeout: Duration,

    /// Upper bound on detect/execute iterations
    pub max_steps: usize,

    /// Extra detection scans allowed when the page moves mid-scan
    pub detect_retries: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            capture_steps: false,
            screenshot_on_error: true,
            output_dir: PathBuf::from("downloads"),
            output_file: None,
            two_factor_timeout: Duration::from_secs(10 * 60),
            max_steps: 30,
            detect_retries: 2,
        }
    }
}

impl RunOptions {
    pub fn debug_dir(&self) -> PathBuf {
        self.output_dir.join("debug")
    }

    /// Where the downloaded artifact should land, given a generated filename.
    pub fn artifact_target(&self, generated: &str) -> PathBuf {
        match &self.output_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.output_dir.join(path),
            None => self.output_dir.join(generated),
        }
    }
}

/// Values captured by one step and consumed by a later one.
///
/// Fields are write-once: the first recorded value is authoritative over any
/// later re-derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedData {
    name: Option<String>,
}

impl ExtractedData {
    /// Holder's full name as shown on the summary page.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Record the holder's name. Returns `false` when a value was already set
    /// or `name` is blank.
    pub fn record_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let name = name.trim();
        if self.name.is_some() || name.is_empty() {
            return false;
        }
        self.name = Some(name.to_string());
        true
    }
}
