//! # ShiftFence Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Geofence evaluation and membership tracking
//! - Location sampling and debouncing
//! - The clock-in/out flow with conflict recovery
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `shiftfence-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod clock;
pub mod geofence;
pub mod notify;
pub mod sampling;

// Re-export specific items to avoid ambiguity
pub use clock::ports::{ClockActionQueue, PerimeterProvider, ResetOutcome, ShiftApi};
pub use clock::{ClockOutcome, ClockRequest, ClockService};
pub use geofence::evaluator::{evaluate, Evaluation};
pub use geofence::ports::MembershipStateStore;
pub use geofence::tracker::MembershipTracker;
pub use geofence::{haversine_distance, InMemoryStateStore};
pub use notify::{
    NotificationAction, NotificationSink, PerimeterNotification, PermissionState,
};
pub use sampling::ports::{LocationFeed, LocationProvider};
pub use sampling::{Debouncer, LocationSampler, SamplerEvent};
