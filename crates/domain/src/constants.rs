//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

/// Mean Earth radius in meters, used by the haversine distance formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// Location sampling
pub const DEBOUNCE_WINDOW_MS: u64 = 1_000;
pub const LOCATION_TIMEOUT_SECS: u64 = 10;
/// Maximum age for a cached fix used by one-shot acquisition.
pub const MAX_SAMPLE_AGE_SECS: u64 = 300;
/// Maximum age for a cached fix delivered through watch mode.
pub const WATCH_SAMPLE_AGE_SECS: u64 = 60;

// Perimeter settings cache
pub const PERIMETER_CACHE_TTL_SECS: u64 = 300;

// Offline queue
pub const MAX_DRAIN_BATCH: usize = 50;

// Notifications
pub const NOTIFICATION_TAG_PREFIX: &str = "perimeter-";
pub const CLOCK_IN_TITLE: &str = "Clock In Available";
pub const CLOCK_IN_BODY: &str = "You're now within the work area. Would you like to clock in?";
pub const CLOCK_OUT_TITLE: &str = "Clock Out Reminder";
pub const CLOCK_OUT_BODY: &str = "You've left the work area. Don't forget to clock out!";

/// Note recorded on a shift force-closed by the reset protocol.
pub const AUTO_CLOCK_OUT_NOTE: &str = "Auto clock-out before starting a new shift";
