//! Clock action service with conflict recovery and offline queueing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use shiftfence_domain::{
    ClockActionKind, ClockPayload, Coordinate, PendingClockAction, Result, Shift, ShiftFenceError,
};
use tracing::{info, instrument, warn};

use super::ports::{ClockActionQueue, ShiftApi};

/// A clock-in or clock-out request from the UI layer.
#[derive(Debug, Clone)]
pub struct ClockRequest {
    pub coordinate: Coordinate,
    pub note: Option<String>,
    /// Consent to auto-close a stale open shift before retrying a clock-in.
    /// The conflict is returned to the caller when not granted, so the UI
    /// always confirms before a shift is force-closed.
    pub allow_auto_close: bool,
}

impl ClockRequest {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate, note: None, allow_auto_close: false }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_auto_close(mut self) -> Self {
        self.allow_auto_close = true;
        self
    }
}

/// Outcome of a clock action.
#[derive(Debug, Clone, PartialEq)]
pub enum ClockOutcome {
    /// The action was applied and the server returned the shift.
    Completed(Shift),
    /// Connectivity failed; the action is durably queued for replay.
    Queued {
        action_id: String,
        /// An identical action was already queued; no new entry was added.
        deduplicated: bool,
    },
    /// A newer request of the same kind started while this one was in
    /// flight; its result was discarded to keep displayed state coherent.
    Superseded,
}

/// Drives clock-in/out against the collaborator API.
pub struct ClockService {
    api: Arc<dyn ShiftApi>,
    queue: Arc<dyn ClockActionQueue>,
    clock_in_generation: AtomicU64,
    clock_out_generation: AtomicU64,
}

impl ClockService {
    pub fn new(api: Arc<dyn ShiftApi>, queue: Arc<dyn ClockActionQueue>) -> Self {
        Self {
            api,
            queue,
            clock_in_generation: AtomicU64::new(0),
            clock_out_generation: AtomicU64::new(0),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn clock_in(&self, request: ClockRequest) -> Result<ClockOutcome> {
        self.submit(ClockActionKind::ClockIn, request).await
    }

    #[instrument(skip(self, request))]
    pub async fn clock_out(&self, request: ClockRequest) -> Result<ClockOutcome> {
        self.submit(ClockActionKind::ClockOut, request).await
    }

    async fn submit(&self, kind: ClockActionKind, request: ClockRequest) -> Result<ClockOutcome> {
        let generation = self.begin(kind);
        let payload =
            ClockPayload { coordinate: request.coordinate, note: request.note.clone() };

        let result = match kind {
            ClockActionKind::ClockIn => self.api.clock_in(&payload).await,
            ClockActionKind::ClockOut => self.api.clock_out(&payload).await,
        };

        if !self.is_current(kind, generation) {
            info!(%kind, "discarding superseded clock response");
            return Ok(ClockOutcome::Superseded);
        }

        match result {
            Ok(shift) => {
                info!(%kind, shift_id = %shift.id, "clock action completed");
                Ok(ClockOutcome::Completed(shift))
            }
            Err(ShiftFenceError::Conflict { message, existing_shift })
                if kind == ClockActionKind::ClockIn =>
            {
                if !request.allow_auto_close {
                    return Err(ShiftFenceError::Conflict { message, existing_shift });
                }
                self.reset_and_retry(&payload, generation).await
            }
            Err(err) if err.is_offline() => self.enqueue_offline(kind, payload, &err).await,
            Err(err) => Err(err),
        }
    }

    /// Two-step recovery for a stale open shift: reset (idempotent), then
    /// exactly one retry of the clock-in. Either step failing surfaces as a
    /// hard error; there is no silent retry loop.
    async fn reset_and_retry(
        &self,
        payload: &ClockPayload,
        generation: u64,
    ) -> Result<ClockOutcome> {
        let outcome = self.api.reset_shift().await?;
        if let Some(closed) = &outcome.closed {
            info!(shift_id = %closed.id, "stale shift force-closed before clock-in");
        }

        let shift = self.api.clock_in(payload).await?;
        if !self.is_current(ClockActionKind::ClockIn, generation) {
            return Ok(ClockOutcome::Superseded);
        }
        Ok(ClockOutcome::Completed(shift))
    }

    async fn enqueue_offline(
        &self,
        kind: ClockActionKind,
        payload: ClockPayload,
        cause: &ShiftFenceError,
    ) -> Result<ClockOutcome> {
        let action = PendingClockAction::new(kind, payload, Utc::now());
        let inserted = self.queue.enqueue(&action).await?;
        warn!(
            %kind,
            action_id = %action.id,
            deduplicated = !inserted,
            error = %cause,
            "clock action queued for replay"
        );
        Ok(ClockOutcome::Queued { action_id: action.id, deduplicated: !inserted })
    }

    fn begin(&self, kind: ClockActionKind) -> u64 {
        self.generation_slot(kind).fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, kind: ClockActionKind, generation: u64) -> bool {
        self.generation_slot(kind).load(Ordering::SeqCst) == generation
    }

    fn generation_slot(&self, kind: ClockActionKind) -> &AtomicU64 {
        match kind {
            ClockActionKind::ClockIn => &self.clock_in_generation,
            ClockActionKind::ClockOut => &self.clock_out_generation,
        }
    }
}
