//! # ShiftFence Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite persistence (membership state, offline action queue)
//! - HTTP client for the collaborator shift API
//! - Background workers (offline drain, perimeter notifications)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `shiftfence-core`
//! - Depends on `shiftfence-domain` and `shiftfence-core`
//! - Contains all "impure" code (I/O, platform adapters)

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod location;
pub mod notifications;
pub mod perimeter;
pub mod sync;

// Re-export commonly used items
pub use api::{ShiftApiClient, ShiftApiConfig};
pub use database::{DbManager, SqliteClockActionQueue, SqliteMembershipStateStore};
pub use http::HttpClient;
pub use location::ChannelLocationProvider;
pub use notifications::{NotificationWorker, NotificationWorkerConfig};
pub use perimeter::CachedPerimeterProvider;
pub use sync::{ClockActionForwarder, DrainWorker, DrainWorkerConfig, SyncError};
