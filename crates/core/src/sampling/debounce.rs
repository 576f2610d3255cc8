//! Trailing-edge debouncer for noisy signals.
//!
//! An explicit stateful object (pending value + deadline) rather than a
//! closure-captured timer, so the coalescing policy is unit-testable in
//! isolation.

use std::time::Duration;

use tokio::time::Instant;

/// Coalesces rapid arrivals: only the latest value within a quiet window is
/// released, and any arrival during the window resets the window.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: None, deadline: None }
    }

    /// Accept a new value, replacing any pending one and resetting the
    /// quiet window.
    pub fn push(&mut self, value: T) {
        self.pending = Some(value);
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Deadline at which the pending value becomes ready, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take the pending value when its quiet window has elapsed.
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Take whatever is pending regardless of the window. Used on shutdown
    /// so a final sample is not swallowed.
    pub fn flush(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }
}
