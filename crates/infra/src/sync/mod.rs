//! Offline action replay.

pub mod drain_worker;
pub mod errors;

pub use drain_worker::{ClockActionForwarder, DrainWorker, DrainWorkerConfig};
pub use errors::{SyncError, SyncErrorCategory};
