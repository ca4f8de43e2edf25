use std::collections::VecDeque;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use parking_lot::Mutex;
use sharecode_core_types::RequesterKey;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::model::{BoxedJob, PositionCallback, QueueItem, QueueStats, SchedulerConfig};

#[derive(Debug)]
struct QueueState {
    waiting: VecDeque<QueueItem>,
    active: usize,
    limit: usize,
    next_seq: u64,
}

/// FIFO admission queue. Clones share one queue.
///
/// At most `limit` jobs run at once; every completion re-drains the queue, so
/// items are admitted strictly in arrival order. A job is not started (and
/// holds no resources) until it is admitted.
#[derive(Clone, Debug)]
pub struct RunScheduler {
    state: Arc<Mutex<QueueState>>,
}

impl Default for RunScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl RunScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                waiting: VecDeque::new(),
                active: 0,
                limit: config.concurrency.max(1),
                next_seq: 0,
            })),
        }
    }

    /// Queue `job` and wait for its output.
    ///
    /// `on_position` hears the item's queue index whenever the queue moves,
    /// and `0` when it is admitted. A panic inside the callback is logged and
    /// ignored. A job that panics settles only this call, with
    /// [`SchedulerError::JobLost`].
    pub async fn enqueue<F, Fut, T>(
        &self,
        key: RequesterKey,
        label: impl Into<String>,
        job: F,
        on_position: PositionCallback,
    ) -> Result<T, SchedulerError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let label = label.into();
        let (sender, receiver) = oneshot::channel();
        let boxed: BoxedJob = Box::new(move || {
            async move {
                let output = job().await;
                let _ = sender.send(output);
            }
            .boxed()
        });

        let seq = {
            let mut state = self.state.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.waiting.push_back(QueueItem {
                seq,
                key: key.clone(),
                label: label.clone(),
                job: boxed,
                on_position: on_position.clone(),
                enqueued_at: Instant::now(),
            });
            debug!(%key, %label, waiting = state.waiting.len(), "job queued");
            seq
        };

        self.drain();

        let queued_at = {
            let state = self.state.lock();
            state.waiting.iter().position(|item| item.seq == seq)
        };
        if let Some(position) = queued_at {
            notify(&on_position, position);
        }

        receiver
            .await
            .map_err(|_| SchedulerError::JobLost { label })
    }

    /// Number of items waiting for admission (active jobs excluded).
    pub fn get_position(&self) -> usize {
        self.state.lock().waiting.len()
    }

    pub fn get_stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            active: state.active,
            waiting: state.waiting.len(),
            limit: state.limit,
        }
    }

    /// Change the concurrency limit. Raising it admits waiting items right
    /// away; lowering it lets running jobs finish.
    pub fn set_concurrency(&self, limit: usize) -> Result<(), SchedulerError> {
        if limit == 0 {
            return Err(SchedulerError::InvalidConcurrency(limit));
        }
        self.state.lock().limit = limit;
        info!(limit, "concurrency updated");
        self.drain();
        Ok(())
    }

    /// Admit items while capacity remains.
    ///
    /// Position callbacks run after the lock is released, before the admitted
    /// jobs are spawned. Without a Tokio runtime admission is deferred to the
    /// next enqueue or completion.
    fn drain(&self) {
        let Ok(runtime) = Handle::try_current() else {
            debug!("no runtime available, admission deferred");
            return;
        };

        let mut admitted = Vec::new();
        let mut notices: Vec<(PositionCallback, usize)> = Vec::new();
        {
            let mut state = self.state.lock();
            while state.active < state.limit {
                let Some(item) = state.waiting.pop_front() else {
                    break;
                };
                state.active += 1;
                notices.push((item.on_position.clone(), 0));
                for (index, waiting) in state.waiting.iter().enumerate() {
                    notices.push((waiting.on_position.clone(), index));
                }
                info!(
                    key = %item.key,
                    label = %item.label,
                    active = state.active,
                    waited_ms = item.enqueued_at.elapsed().as_millis() as u64,
                    "job admitted"
                );
                admitted.push(item);
            }
        }

        for (callback, position) in notices {
            notify(&callback, position);
        }

        for item in admitted {
            let scheduler = self.clone();
            let QueueItem { key, label, job, .. } = item;
            runtime.spawn(async move {
                if let Err(err) = tokio::spawn(job()).await {
                    warn!(%key, %label, %err, "job aborted");
                }
                scheduler.complete(&key);
            });
        }
    }

    fn complete(&self, key: &RequesterKey) {
        {
            let mut state = self.state.lock();
            state.active = state.active.saturating_sub(1);
            debug!(%key, active = state.active, waiting = state.waiting.len(), "job settled");
        }
        self.drain();
    }
}

fn notify(callback: &PositionCallback, position: usize) {
    if catch_unwind(AssertUnwindSafe(|| callback(position))).is_err() {
        warn!(position, "position callback panicked");
    }
}
