use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use sharecode_core_types::RequesterKey;

/// Receives zero-based queue positions; `0` is sent both to the head of the
/// queue and to an item at the moment it is admitted.
pub type PositionCallback = Arc<dyn Fn(usize) + Send + Sync>;

pub(crate) type BoxedJob = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

pub const DEFAULT_CONCURRENCY: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of jobs running at once
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub active: usize,
    pub waiting: usize,
    pub limit: usize,
}

pub(crate) struct QueueItem {
    pub seq: u64,
    pub key: RequesterKey,
    pub label: String,
    pub job: BoxedJob,
    pub on_position: PositionCallback,
    pub enqueued_at: Instant,
}

impl fmt::Debug for QueueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueItem")
            .field("seq", &self.seq)
            .field("key", &self.key)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
