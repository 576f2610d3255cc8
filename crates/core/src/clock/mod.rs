//! Clock-in/out flow.
//!
//! Wraps the collaborator shift API with the recovery behavior the geofence
//! core depends on: the reset-then-retry protocol for stale open shifts,
//! offline queueing of failed clock actions, and discarding of superseded
//! in-flight requests.

pub mod ports;
pub mod service;

pub use ports::{ClockActionQueue, PerimeterProvider, ResetOutcome, ShiftApi};
pub use service::{ClockOutcome, ClockRequest, ClockService};
