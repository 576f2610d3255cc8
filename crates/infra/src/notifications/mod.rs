//! Background notification worker.
//!
//! Consumes `WorkerMessage`s from the host over a channel, runs each fix
//! through the membership tracker, and delivers a perimeter prompt when a
//! resolved transition occurs. Without notification permission the worker
//! still tracks state but delivers nothing.

use std::sync::Arc;
use std::time::Duration;

use shiftfence_core::{
    MembershipTracker, NotificationSink, PermissionState, PerimeterNotification,
};
use shiftfence_domain::WorkerMessage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Configuration for the notification worker.
#[derive(Debug, Clone)]
pub struct NotificationWorkerConfig {
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for NotificationWorkerConfig {
    fn default() -> Self {
        Self { join_timeout: Duration::from_secs(5) }
    }
}

/// Worker consuming location updates and permission requests from the host.
pub struct NotificationWorker {
    tracker: Arc<MembershipTracker>,
    sink: Arc<dyn NotificationSink>,
    config: NotificationWorkerConfig,
    inbox: Option<mpsc::Receiver<WorkerMessage>>,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl NotificationWorker {
    pub fn new(
        tracker: Arc<MembershipTracker>,
        sink: Arc<dyn NotificationSink>,
        config: NotificationWorkerConfig,
        inbox: mpsc::Receiver<WorkerMessage>,
    ) -> Self {
        Self {
            tracker,
            sink,
            config,
            inbox: Some(inbox),
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the worker, spawning the message loop.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), String> {
        if self.is_running() {
            return Err("Worker already running".to_string());
        }

        let inbox = self.inbox.take().ok_or_else(|| "Worker inbox already consumed".to_string())?;

        info!("Starting notification worker");

        self.cancellation = CancellationToken::new();

        let tracker = Arc::clone(&self.tracker);
        let sink = Arc::clone(&self.sink);
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::message_loop(tracker, sink, inbox, cancel).await;
        });

        self.task_handle = Some(handle);
        info!("Notification worker started");

        Ok(())
    }

    /// Stop the worker and wait for the message loop to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), String> {
        if !self.is_running() {
            return Err("Worker not running".to_string());
        }

        info!("Stopping notification worker");

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

        info!("Notification worker stopped");
        self.cancellation = CancellationToken::new();

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    async fn message_loop(
        tracker: Arc<MembershipTracker>,
        sink: Arc<dyn NotificationSink>,
        mut inbox: mpsc::Receiver<WorkerMessage>,
        cancel: CancellationToken,
    ) {
        // The permission prompt fires at most once per worker run.
        let mut permission_requested = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Notification worker message loop cancelled");
                    break;
                }
                message = inbox.recv() => {
                    let Some(message) = message else {
                        debug!("Worker inbox closed, stopping notification worker");
                        break;
                    };
                    match message {
                        WorkerMessage::LocationUpdate { location, perimeter } => {
                            Self::handle_location_update(
                                &tracker,
                                sink.as_ref(),
                                &location,
                                perimeter.as_ref(),
                            )
                            .await;
                        }
                        WorkerMessage::RequestPermission => {
                            if permission_requested {
                                debug!("Permission already requested this run");
                                continue;
                            }
                            if sink.permission().await != PermissionState::Undetermined {
                                debug!("Permission already determined, not prompting");
                                continue;
                            }
                            permission_requested = true;
                            match sink.request_permission().await {
                                Ok(state) => info!(granted = (state == PermissionState::Granted), "Permission prompt answered"),
                                Err(e) => warn!(error = %e, "Permission request failed"),
                            }
                        }
                    }
                }
            }
        }
    }

    async fn handle_location_update(
        tracker: &MembershipTracker,
        sink: &dyn NotificationSink,
        location: &shiftfence_domain::LocationSample,
        perimeter: Option<&shiftfence_domain::Perimeter>,
    ) {
        let observation = match tracker.observe(location, perimeter).await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(error = %e, "Membership evaluation failed");
                return;
            }
        };

        let Some(transition) = observation.evaluation.transition else {
            return;
        };

        debug!(
            from = %transition.from,
            to = %transition.to,
            distance_meters = transition.distance_meters,
            "Membership transition detected"
        );

        let Some(notification) = PerimeterNotification::from_transition(&transition) else {
            return;
        };

        if sink.permission().await != PermissionState::Granted {
            debug!(tag = %notification.tag, "Notification suppressed, permission not granted");
            return;
        }

        if let Err(e) = sink.show(&notification).await {
            warn!(error = %e, tag = %notification.tag, "Notification delivery failed");
        }
    }
}

impl Drop for NotificationWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("NotificationWorker dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
