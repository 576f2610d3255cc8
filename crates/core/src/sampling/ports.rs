//! Port interfaces for device location acquisition

use async_trait::async_trait;
use shiftfence_domain::{LocationSample, Result};
use tokio::sync::mpsc;

/// Raw fixes delivered by the platform, in arrival order.
pub type LocationFeed = mpsc::Receiver<LocationSample>;

/// Trait for acquiring device location from the platform.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Acquire a single fix. Denied permission or hardware failure surfaces
    /// as a `Location` error; the caller wraps this in a timeout.
    async fn current_location(&self) -> Result<LocationSample>;

    /// Open a continuous feed of raw fixes. The feed closing is the
    /// terminal "unavailable" condition.
    async fn watch(&self) -> Result<LocationFeed>;
}
