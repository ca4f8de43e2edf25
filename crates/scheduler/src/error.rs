use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The job panicked or was torn down before producing its output
    #[error("job `{label}` ended without a result")]
    JobLost { label: String },
    #[error("invalid concurrency limit {0}")]
    InvalidConcurrency(usize),
}
