//! Location sampling service.

use std::sync::Arc;
use std::time::Duration;

use shiftfence_domain::{LocationSample, Result, ShiftFenceError};
use tokio::sync::{mpsc, RwLock};
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, warn};

use super::debounce::Debouncer;
use super::ports::LocationProvider;

/// Event delivered to the consumer of the watch loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerEvent {
    /// A debounced sample ready for evaluation.
    Sample(LocationSample),
    /// Terminal condition: the platform denied access or the feed ended.
    /// The consumer decides the UI fallback; the sampler never stalls
    /// silently.
    Unavailable(String),
}

/// Acquires device location and delivers debounced samples, while keeping
/// the most recent raw sample available for immediate display.
pub struct LocationSampler {
    provider: Arc<dyn LocationProvider>,
    acquisition_timeout: Duration,
    debounce_window: Duration,
    latest: Arc<RwLock<Option<LocationSample>>>,
}

impl LocationSampler {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        acquisition_timeout: Duration,
        debounce_window: Duration,
    ) -> Self {
        Self {
            provider,
            acquisition_timeout,
            debounce_window,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// One-shot acquisition for immediate display. Bounded by the
    /// acquisition timeout; a hung platform call reports unavailability
    /// instead of hanging the caller.
    pub async fn current_location(&self) -> Result<LocationSample> {
        let sample = timeout(self.acquisition_timeout, self.provider.current_location())
            .await
            .map_err(|_| {
                ShiftFenceError::Location(format!(
                    "location acquisition timed out after {:?}",
                    self.acquisition_timeout
                ))
            })??;

        *self.latest.write().await = Some(sample);
        Ok(sample)
    }

    /// Most recent raw sample seen by either acquisition mode.
    pub async fn latest(&self) -> Option<LocationSample> {
        *self.latest.read().await
    }

    /// Run the continuous watch loop until the feed ends or the consumer
    /// goes away. Raw arrivals are coalesced through the debouncer; only
    /// the latest sample within each quiet window is forwarded.
    pub async fn run_watch(&self, events: mpsc::Sender<SamplerEvent>) {
        let mut feed = match self.provider.watch().await {
            Ok(feed) => feed,
            Err(err) => {
                warn!(error = %err, "watch mode could not start");
                let _ = events.send(SamplerEvent::Unavailable(err.to_string())).await;
                return;
            }
        };

        let mut debouncer: Debouncer<LocationSample> = Debouncer::new(self.debounce_window);

        loop {
            // With nothing pending, park far in the future; pushing a sample
            // establishes the real deadline.
            let deadline = debouncer
                .deadline()
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3_600));

            tokio::select! {
                arrival = feed.recv() => {
                    match arrival {
                        Some(sample) => {
                            *self.latest.write().await = Some(sample);
                            debouncer.push(sample);
                        }
                        None => {
                            debug!("location feed closed");
                            if let Some(sample) = debouncer.flush() {
                                let _ = events.send(SamplerEvent::Sample(sample)).await;
                            }
                            let _ = events
                                .send(SamplerEvent::Unavailable("location feed ended".into()))
                                .await;
                            return;
                        }
                    }
                }
                _ = sleep_until(deadline) => {
                    if let Some(sample) = debouncer.fire(Instant::now()) {
                        if events.send(SamplerEvent::Sample(sample)).await.is_err() {
                            debug!("sampler consumer dropped, stopping watch");
                            return;
                        }
                    }
                }
            }
        }
    }
}
