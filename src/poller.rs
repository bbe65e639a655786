//! Bounded status polling for in-flight documents.
//!
//! One loop per durable document id, started after a successful upload.
//! Each tick fetches a fresh status snapshot and hands it to the owner;
//! tick failures are swallowed since the next tick retries. The loop stops
//! on any terminal status, when the hard timeout elapses, or when the
//! owning handle cancels it (including by being dropped).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::api::Backend;
use crate::config::{Settings, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_TIMEOUT_SECS};
use crate::models::DocumentSnapshot;

/// Poll loop timing.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
        }
    }
}

impl From<&Settings> for PollConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            interval: settings.poll_interval(),
            timeout: settings.poll_timeout(),
        }
    }
}

/// Handle for one running poll loop.
///
/// Dropping the handle cancels the loop, binding its lifetime to the
/// owner's.
pub struct PollHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Request the loop to stop at the next suspension point.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to finish (terminal status, timeout, or stop).
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Spawns per-document poll loops.
#[derive(Clone)]
pub struct StatusPoller {
    backend: Arc<dyn Backend>,
    config: PollConfig,
}

impl StatusPoller {
    pub fn new(backend: Arc<dyn Backend>, config: PollConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Start a poll loop for `document_id`.
    ///
    /// `apply` receives every successfully fetched snapshot, in receipt
    /// order; the loop awaits each response before sleeping for the next
    /// tick, so a newer snapshot can never be overwritten by an older one.
    pub fn spawn<F>(&self, document_id: i64, mut apply: F) -> PollHandle
    where
        F: FnMut(DocumentSnapshot) + Send + 'static,
    {
        let backend = self.backend.clone();
        let config = self.config;
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let deadline = tokio::time::Instant::now() + config.timeout;
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + config.interval,
                config.interval,
            );
            // A slow response should delay the next tick, not burst.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => {
                        debug!("Poll loop for document {} cancelled", document_id);
                        break;
                    }
                    _ = tokio::time::sleep_until(deadline) => {
                        debug!("Poll loop for document {} timed out", document_id);
                        break;
                    }
                    _ = ticker.tick() => {
                        match backend.get_document(document_id).await {
                            Ok(snapshot) => {
                                let status = snapshot.status.clone();
                                apply(snapshot);
                                if status.is_terminal() {
                                    debug!(
                                        "Poll loop for document {} reached terminal status {}",
                                        document_id, status
                                    );
                                    break;
                                }
                            }
                            // Transient tick failures self-heal on the
                            // next tick.
                            Err(err) => {
                                debug!(
                                    "Poll tick for document {} failed: {}",
                                    document_id, err
                                );
                            }
                        }
                    }
                }
            }
        });

        PollHandle { stop_tx, task }
    }
}
