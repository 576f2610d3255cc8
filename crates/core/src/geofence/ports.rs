//! Port interfaces for membership state persistence
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use shiftfence_domain::{MembershipState, Result};

/// Durable last-known membership state for this device.
///
/// Must survive process restarts so that reopening the app after being
/// backgrounded does not re-fire a notification for a state that was already
/// true before closing. The first-ever read returns `Unknown`. A single
/// writer per device is assumed; no cross-device coordination.
#[async_trait]
pub trait MembershipStateStore: Send + Sync {
    /// Read the persisted state, `Unknown` when none has been stored yet.
    async fn get(&self) -> Result<MembershipState>;

    /// Persist the new state.
    async fn set(&self, state: MembershipState) -> Result<()>;
}
