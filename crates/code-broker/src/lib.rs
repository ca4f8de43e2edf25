//! Pending security-code requests keyed by requester.
//!
//! A run that reaches the code page parks in [`TwoFactorExchange::request_code`]
//! until a human submits the code, the deadline passes, or a newer request for
//! the same requester replaces it. Exactly one of those outcomes settles each
//! request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sharecode_core_types::{RequesterKey, TwoFactorMethod};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info};

/// Why a code request ended without a code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TwoFactorError {
    /// Deadline elapsed with no submission
    #[error("2FA timeout for {label}")]
    Timeout { label: String },

    /// A newer request for the same requester replaced this one
    #[error("Superseded by new request")]
    Superseded,

    /// The exchange dropped the request without settling it
    #[error("code request abandoned")]
    Abandoned,
}

type Outcome = Result<String, TwoFactorError>;

struct PendingEntry {
    id: u64,
    method: TwoFactorMethod,
    label: String,
    deadline: Instant,
    sender: oneshot::Sender<Outcome>,
}

/// Read-only view of a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub method: TwoFactorMethod,
    pub label: String,
    pub deadline: Instant,
}

/// Process-wide registry of pending code requests; share it behind an `Arc`.
#[derive(Default)]
pub struct TwoFactorExchange {
    pending: Mutex<HashMap<RequesterKey, PendingEntry>>,
    next_id: AtomicU64,
}

impl TwoFactorExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a request for `key` and wait for its outcome.
    ///
    /// Any request already pending for `key` is rejected with
    /// [`TwoFactorError::Superseded`] first. If the returned future is dropped
    /// the entry is removed.
    pub async fn request_code(
        &self,
        key: RequesterKey,
        method: TwoFactorMethod,
        label: impl Into<String>,
        deadline: Instant,
    ) -> Outcome {
        let label = label.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, mut receiver) = oneshot::channel();

        {
            let mut pending = self.pending.lock();
            let entry = PendingEntry {
                id,
                method,
                label: label.clone(),
                deadline,
                sender,
            };
            if let Some(previous) = pending.insert(key.clone(), entry) {
                info!(%key, label = %previous.label, "superseding pending code request");
                let _ = previous.sender.send(Err(TwoFactorError::Superseded));
            }
        }
        debug!(%key, %method, %label, "code request installed");

        let _guard = PendingGuard {
            exchange: self,
            key: &key,
            id,
        };

        match tokio::time::timeout_at(deadline, &mut receiver).await {
            Ok(received) => received.unwrap_or(Err(TwoFactorError::Abandoned)),
            Err(_) => {
                if self.remove_if_current(&key, id) {
                    info!(%key, %label, "code request timed out");
                    Err(TwoFactorError::Timeout { label })
                } else {
                    // Settled concurrently with the deadline; the outcome is
                    // already in the channel.
                    receiver.await.unwrap_or(Err(TwoFactorError::Abandoned))
                }
            }
        }
    }

    /// Resolve the pending request for `key` with `code`.
    ///
    /// Returns `false` when nothing was waiting, so the caller can treat the
    /// input as an ordinary message.
    pub fn submit_code(&self, key: &RequesterKey, code: impl Into<String>) -> bool {
        let entry = self.pending.lock().remove(key);
        match entry {
            Some(entry) => {
                debug!(%key, label = %entry.label, "code submitted");
                entry.sender.send(Ok(code.into())).is_ok()
            }
            None => false,
        }
    }

    pub fn has_pending(&self, key: &RequesterKey) -> bool {
        self.pending.lock().contains_key(key)
    }

    pub fn pending(&self, key: &RequesterKey) -> Option<PendingRequest> {
        self.pending.lock().get(key).map(|entry| PendingRequest {
            method: entry.method,
            label: entry.label.clone(),
            deadline: entry.deadline,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn remove_if_current(&self, key: &RequesterKey, id: u64) -> bool {
        let mut pending = self.pending.lock();
        if pending.get(key).map(|entry| entry.id) == Some(id) {
            pending.remove(key);
            true
        } else {
            false
        }
    }
}

/// Removes the entry a dropped request left behind.
struct PendingGuard<'a> {
    exchange: &'a TwoFactorExchange,
    key: &'a RequesterKey,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.exchange.remove_if_current(self.key, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn key(name: &str) -> RequesterKey {
        RequesterKey::new(name)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn submit_resolves_pending_request() {
        let exchange = Arc::new(TwoFactorExchange::new());
        let waiter = {
            let exchange = exchange.clone();
            tokio::spawn(async move {
                exchange
                    .request_code(
                        key("alice"),
                        TwoFactorMethod::Sms,
                        "Alice",
                        Instant::now() + Duration::from_secs(5),
                    )
                    .await
            })
        };
        while !exchange.has_pending(&key("alice")) {
            settle().await;
        }

        assert!(exchange.submit_code(&key("alice"), "123456"));
        assert_eq!(waiter.await.unwrap(), Ok("123456".to_string()));
        assert!(!exchange.has_pending(&key("alice")));
        assert!(!exchange.submit_code(&key("alice"), "123456"));
    }

    #[test]
    fn submit_without_pending_returns_false() {
        let exchange = TwoFactorExchange::new();
        assert!(!exchange.submit_code(&key("nobody"), "0000"));
        assert_eq!(exchange.pending_count(), 0);
    }

    #[test]
    fn past_deadline_times_out_and_clears_the_entry() {
        let exchange = TwoFactorExchange::new();
        let outcome = tokio_test::block_on(exchange.request_code(
            key("gina"),
            TwoFactorMethod::Email,
            "Gina",
            Instant::now(),
        ));
        assert_eq!(
            outcome,
            Err(TwoFactorError::Timeout {
                label: "Gina".into()
            })
        );
        assert_eq!(exchange.pending_count(), 0);
    }

    #[tokio::test]
    async fn second_request_supersedes_first() {
        let exchange = Arc::new(TwoFactorExchange::new());
        let deadline = Instant::now() + Duration::from_secs(60);

        let first = {
            let exchange = exchange.clone();
            tokio::spawn(async move {
                exchange
                    .request_code(key("bob"), TwoFactorMethod::Sms, "Bob", deadline)
                    .await
            })
        };
        while !exchange.has_pending(&key("bob")) {
            settle().await;
        }
        let second = {
            let exchange = exchange.clone();
            tokio::spawn(async move {
                exchange
                    .request_code(key("bob"), TwoFactorMethod::Email, "Bob again", deadline)
                    .await
            })
        };

        assert_eq!(first.await.unwrap(), Err(TwoFactorError::Superseded));
        let pending = exchange.pending(&key("bob")).unwrap();
        assert_eq!(pending.method, TwoFactorMethod::Email);
        assert_eq!(pending.label, "Bob again");

        assert!(exchange.submit_code(&key("bob"), "654321"));
        assert_eq!(second.await.unwrap(), Ok("654321".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn request_times_out_at_deadline() {
        let exchange = TwoFactorExchange::new();
        let started = Instant::now();
        let outcome = exchange
            .request_code(
                key("carol"),
                TwoFactorMethod::Sms,
                "Carol",
                started + Duration::from_millis(100),
            )
            .await;

        assert_eq!(
            outcome,
            Err(TwoFactorError::Timeout {
                label: "Carol".into()
            })
        );
        assert_eq!(outcome.unwrap_err().to_string(), "2FA timeout for Carol");
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(100) && waited < Duration::from_millis(150));
        assert!(!exchange.has_pending(&key("carol")));
        assert!(!exchange.submit_code(&key("carol"), "111111"));
    }

    #[tokio::test]
    async fn dropped_request_leaves_no_entry() {
        let exchange = TwoFactorExchange::new();
        {
            let request = exchange.request_code(
                key("dave"),
                TwoFactorMethod::Sms,
                "Dave",
                Instant::now() + Duration::from_secs(60),
            );
            let outcome = tokio::time::timeout(Duration::from_millis(10), request).await;
            assert!(outcome.is_err());
        }
        assert!(!exchange.has_pending(&key("dave")));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let exchange = Arc::new(TwoFactorExchange::new());
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut waiters = Vec::new();
        for name in ["erin", "frank"] {
            let exchange = exchange.clone();
            waiters.push(tokio::spawn(async move {
                exchange
                    .request_code(key(name), TwoFactorMethod::Sms, name, deadline)
                    .await
            }));
        }
        while exchange.pending_count() < 2 {
            settle().await;
        }

        assert!(exchange.submit_code(&key("frank"), "2222"));
        assert!(exchange.submit_code(&key("erin"), "1111"));
        let results: Vec<_> = join_outcomes(waiters).await;
        assert_eq!(results, vec![Ok("1111".to_string()), Ok("2222".to_string())]);
    }

    async fn join_outcomes(
        handles: Vec<tokio::task::JoinHandle<Outcome>>,
    ) -> Vec<Outcome> {
        let mut out = Vec::new();
        for handle in handles {
            out.push(handle.await.unwrap());
        }
        out
    }
}
