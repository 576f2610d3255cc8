//! Channel-backed location provider.
//!
//! The host process owns the actual positioning source (GPS daemon, mobile
//! bridge, test harness) and pushes raw fixes into this provider. One-shot
//! acquisition takes the next fix off the stream; watch mode hands the
//! stream over wholesale.

use std::sync::Arc;

use async_trait::async_trait;
use shiftfence_core::{LocationFeed, LocationProvider};
use shiftfence_domain::{LocationSample, Result, ShiftFenceError};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Provider fed by the host over an mpsc channel.
///
/// `current_location` and an active `watch` consume from the same underlying
/// stream, so a fix taken by a one-shot is not also delivered to the feed.
/// Once `watch` has handed the stream over, further one-shots fail.
pub struct ChannelLocationProvider {
    feed: Arc<Mutex<Option<LocationFeed>>>,
}

impl ChannelLocationProvider {
    /// Create a provider and the sender half the host pushes fixes into.
    /// Dropping the sender is the terminal "location unavailable" signal.
    pub fn new(buffer: usize) -> (Self, mpsc::Sender<LocationSample>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { feed: Arc::new(Mutex::new(Some(rx))) }, tx)
    }
}

#[async_trait]
impl LocationProvider for ChannelLocationProvider {
    async fn current_location(&self) -> Result<LocationSample> {
        let mut guard = self.feed.lock().await;
        let feed = guard
            .as_mut()
            .ok_or_else(|| ShiftFenceError::Location("location feed already taken".to_string()))?;

        match feed.recv().await {
            Some(sample) => {
                debug!(captured_at = %sample.captured_at, "One-shot fix acquired");
                Ok(sample)
            }
            None => Err(ShiftFenceError::Location("location source closed".to_string())),
        }
    }

    async fn watch(&self) -> Result<LocationFeed> {
        let mut guard = self.feed.lock().await;
        guard
            .take()
            .ok_or_else(|| ShiftFenceError::Location("location feed already taken".to_string()))
    }
}
