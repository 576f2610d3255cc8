//! SQLite persistence for the geofence engine.

pub mod action_queue;
pub mod manager;
pub mod state_store;

pub use action_queue::SqliteClockActionQueue;
pub use manager::DbManager;
pub use state_store::SqliteMembershipStateStore;
