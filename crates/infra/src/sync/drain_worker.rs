//! Drain worker replaying offline clock actions on reconnect.
//!
//! Listens on a connectivity watch channel; every offline-to-online edge
//! triggers exactly one FIFO drain pass over the durable queue. Join handles
//! are tracked, cancellation is explicit, and the whole pass is wrapped in a
//! timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shiftfence_core::ClockActionQueue;
use shiftfence_domain::constants::MAX_DRAIN_BATCH;
use shiftfence_domain::{ClockActionKind, PendingClockAction, Shift};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::api::ShiftApiClient;
use crate::sync::errors::SyncError;

/// Configuration for the drain worker.
#[derive(Debug, Clone)]
pub struct DrainWorkerConfig {
    /// Maximum number of actions replayed per pass
    pub batch_size: usize,
    /// Timeout for a single drain pass
    pub processing_timeout: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for DrainWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_DRAIN_BATCH,
            processing_timeout: Duration::from_secs(120),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Interface for replaying a queued clock action against its original
/// endpoint.
#[async_trait]
pub trait ClockActionForwarder: Send + Sync {
    async fn forward(&self, action: &PendingClockAction) -> Result<Shift, SyncError>;
}

#[async_trait]
impl ClockActionForwarder for ShiftApiClient {
    async fn forward(&self, action: &PendingClockAction) -> Result<Shift, SyncError> {
        use shiftfence_core::ShiftApi;

        let result = match action.kind {
            ClockActionKind::ClockIn => self.clock_in(&action.payload).await,
            ClockActionKind::ClockOut => self.clock_out(&action.payload).await,
        };
        result.map_err(SyncError::from)
    }
}

/// Drain worker with explicit lifecycle management.
pub struct DrainWorker {
    queue: Arc<dyn ClockActionQueue>,
    forwarder: Arc<dyn ClockActionForwarder>,
    config: DrainWorkerConfig,
    online_rx: watch::Receiver<bool>,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl DrainWorker {
    /// Create a new drain worker listening on the given connectivity signal.
    pub fn new(
        queue: Arc<dyn ClockActionQueue>,
        forwarder: Arc<dyn ClockActionForwarder>,
        config: DrainWorkerConfig,
        online_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            forwarder,
            config,
            online_rx,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the worker, spawning the background replay task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), String> {
        if self.is_running() {
            return Err("Worker already running".to_string());
        }

        info!("Starting drain worker");

        self.cancellation = CancellationToken::new();

        let queue = Arc::clone(&self.queue);
        let forwarder = Arc::clone(&self.forwarder);
        let batch_size = self.config.batch_size;
        let processing_timeout = self.config.processing_timeout;
        let online_rx = self.online_rx.clone();
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::process_loop(queue, forwarder, batch_size, processing_timeout, online_rx, cancel)
                .await;
        });

        self.task_handle = Some(handle);
        info!("Drain worker started");

        Ok(())
    }

    /// Stop the worker and wait for the replay task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), String> {
        if !self.is_running() {
            return Err("Worker not running".to_string());
        }

        info!("Stopping drain worker");

        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.config.join_timeout;
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Worker task panicked: {}", e);
                    return Err("Worker task panicked".to_string());
                }
                Err(_) => {
                    warn!("Worker task did not complete within timeout");
                    return Err("Worker task timeout".to_string());
                }
            }
        }

        info!("Drain worker stopped");
        self.cancellation = CancellationToken::new();

        Ok(())
    }

    /// Returns true when a worker instance is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Background loop: one drain pass per offline-to-online edge.
    async fn process_loop(
        queue: Arc<dyn ClockActionQueue>,
        forwarder: Arc<dyn ClockActionForwarder>,
        batch_size: usize,
        processing_timeout: Duration,
        mut online_rx: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Drain worker process loop cancelled");
                    break;
                }
                changed = online_rx.changed() => {
                    if changed.is_err() {
                        debug!("Connectivity signal dropped, stopping drain worker");
                        break;
                    }
                    if !*online_rx.borrow_and_update() {
                        debug!("Connectivity lost");
                        continue;
                    }

                    info!("Connectivity restored, draining offline actions");
                    match tokio::time::timeout(
                        processing_timeout,
                        Self::drain_once(&queue, &forwarder, batch_size),
                    )
                    .await
                    {
                        Ok(Ok(replayed)) => {
                            debug!(replayed, "Drain pass completed");
                        }
                        Ok(Err(e)) => {
                            error!(error = %e, "Drain pass failed");
                        }
                        Err(_) => {
                            warn!(
                                timeout_secs = processing_timeout.as_secs(),
                                "Drain pass timed out"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Replay pending actions in creation order, one at a time.
    ///
    /// On a retryable failure the pass stops: a clock-out enqueued after a
    /// clock-in depends on the clock-in having been applied first, so the
    /// remainder waits for the next connectivity event. Non-retryable
    /// rejections are discarded so a poisoned entry cannot wedge the queue.
    pub async fn drain_once(
        queue: &Arc<dyn ClockActionQueue>,
        forwarder: &Arc<dyn ClockActionForwarder>,
        batch_size: usize,
    ) -> Result<usize, String> {
        let actions = queue
            .pending(batch_size)
            .await
            .map_err(|e| format!("Failed to read pending actions: {e}"))?;

        if actions.is_empty() {
            debug!("No pending actions to replay");
            return Ok(0);
        }

        info!(count = actions.len(), "Replaying offline clock actions");

        let mut replayed = 0_usize;
        for action in actions {
            match forwarder.forward(&action).await {
                Ok(shift) => {
                    debug!(
                        action_id = %action.id,
                        shift_id = %shift.id,
                        "Replayed offline clock action"
                    );
                    queue
                        .mark_done(&action.id)
                        .await
                        .map_err(|e| format!("mark_done error for {}: {}", action.id, e))?;
                    replayed += 1;
                }
                Err(err) if err.should_retry() => {
                    warn!(
                        action_id = %action.id,
                        error = %err,
                        "Replay failed, action stays queued"
                    );
                    queue
                        .mark_failed(&action.id, &err.to_string())
                        .await
                        .map_err(|e| format!("mark_failed error for {}: {}", action.id, e))?;
                    // Later actions may depend on this one; stop the pass.
                    break;
                }
                Err(err) => {
                    warn!(
                        action_id = %action.id,
                        error = %err,
                        "Replay rejected permanently, discarding action"
                    );
                    queue
                        .mark_done(&action.id)
                        .await
                        .map_err(|e| format!("mark_done error for {}: {}", action.id, e))?;
                }
            }
        }

        Ok(replayed)
    }
}

impl Drop for DrainWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("DrainWorker dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
