//! Operator input: security codes typed on stdin

use std::io::BufRead;
use std::sync::Arc;

use code_broker::TwoFactorExchange;
use sharecode_core_types::RequesterKey;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::runner::submit_candidate;

/// Stdin lines, read on a plain thread so a blocked read never holds up
/// runtime shutdown.
pub fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(%err, "stopped reading stdin");
                        break;
                    }
                }
            }
        });
    if let Err(err) = spawned {
        warn!(%err, "failed to start stdin reader; codes cannot be entered");
    }
    rx
}

/// Split a `<key> <code>` line.
pub fn parse_keyed_code(line: &str) -> Option<(RequesterKey, &str)> {
    let mut parts = line.split_whitespace();
    let key = parts.next()?;
    let code = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((RequesterKey::new(key), code))
}

/// How an input line is attributed to a requester.
#[derive(Debug, Clone)]
pub enum CodeRouting {
    /// Every line belongs to this requester
    Single(RequesterKey),
    /// Lines carry the requester key in front of the code
    Keyed,
}

impl CodeRouting {
    fn resolve<'a>(&self, line: &'a str) -> Option<(RequesterKey, &'a str)> {
        match self {
            CodeRouting::Single(key) => Some((key.clone(), line)),
            CodeRouting::Keyed => parse_keyed_code(line),
        }
    }
}

/// Feed lines into the exchange until the input ends or the task is aborted.
pub fn spawn_code_router(
    exchange: Arc<TwoFactorExchange>,
    routing: CodeRouting,
    mut lines: mpsc::UnboundedReceiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = lines.recv().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, code)) = routing.resolve(line) else {
                warn!("expected `<key> <code>`, ignoring input line");
                continue;
            };
            if submit_candidate(&exchange, &key, code) {
                info!(%key, "security code submitted");
            } else {
                warn!(%key, "input not accepted as a code; nothing pending or not 4-8 digits");
            }
        }
        debug!("code input closed");
    })
}
