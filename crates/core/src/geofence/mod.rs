//! Perimeter membership evaluation.
//!
//! The distance calculator and evaluator are pure functions; the tracker
//! wraps them with the durable state store so edge transitions are detected
//! exactly once.

pub mod distance;
pub mod evaluator;
pub mod ports;
pub mod tracker;

pub use distance::haversine_distance;
pub use evaluator::{evaluate, Evaluation};
pub use ports::MembershipStateStore;
pub use tracker::{InMemoryStateStore, MembershipTracker};
