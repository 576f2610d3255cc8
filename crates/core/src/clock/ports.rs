//! Port interfaces for the clock flow
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use shiftfence_domain::{ClockPayload, PendingClockAction, Perimeter, Result, Shift};

/// Result of the idempotent server-side reset operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetOutcome {
    /// The shift that was force-closed, `None` when no open shift existed.
    pub closed: Option<Shift>,
}

/// Collaborator endpoints consumed by the core.
///
/// A clock-in against an already-open shift must surface as the typed
/// `Conflict` error carrying the existing shift, so callers can drive the
/// reset-retry protocol.
#[async_trait]
pub trait ShiftApi: Send + Sync {
    /// Fetch the active perimeter, `None` when geofencing is not configured.
    async fn fetch_perimeter(&self) -> Result<Option<Perimeter>>;

    /// Create a new shift.
    async fn clock_in(&self, payload: &ClockPayload) -> Result<Shift>;

    /// Close the caller's open shift.
    async fn clock_out(&self, payload: &ClockPayload) -> Result<Shift>;

    /// Idempotently force-close any open shift for the caller.
    async fn reset_shift(&self) -> Result<ResetOutcome>;

    /// The caller's current open shift, if any.
    async fn active_shift(&self) -> Result<Option<Shift>>;
}

/// Durable queue of clock actions attempted while offline.
#[async_trait]
pub trait ClockActionQueue: Send + Sync {
    /// Enqueue an action. Returns `false` when an entry with the same
    /// idempotency key was already queued (rapid double-submit dedup).
    async fn enqueue(&self, action: &PendingClockAction) -> Result<bool>;

    /// Pending actions in creation order (FIFO).
    async fn pending(&self, limit: usize) -> Result<Vec<PendingClockAction>>;

    /// Remove a successfully replayed action.
    async fn mark_done(&self, id: &str) -> Result<()>;

    /// Record a failed replay attempt; the action stays queued.
    async fn mark_failed(&self, id: &str, error: &str) -> Result<()>;
}

/// Cached view of the active perimeter.
#[async_trait]
pub trait PerimeterProvider: Send + Sync {
    async fn active_perimeter(&self) -> Result<Option<Perimeter>>;
}
