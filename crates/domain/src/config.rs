//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub tracking: TrackingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Collaborator API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Location tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Quiet window for coalescing watch-mode samples.
    pub debounce_ms: u64,
    /// Hard limit on a single location acquisition attempt.
    pub location_timeout_seconds: u64,
    /// Oldest cached fix accepted for one-shot display.
    pub max_sample_age_seconds: u64,
    /// Oldest cached fix accepted from the watch feed.
    pub watch_sample_age_seconds: u64,
    /// TTL for the cached active perimeter.
    pub perimeter_cache_ttl_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: "shiftfence.db".to_string(), pool_size: 4 },
            api: ApiConfig {
                base_url: "http://localhost:3000/api".to_string(),
                timeout_seconds: 30,
            },
            tracking: TrackingConfig {
                debounce_ms: constants::DEBOUNCE_WINDOW_MS,
                location_timeout_seconds: constants::LOCATION_TIMEOUT_SECS,
                max_sample_age_seconds: constants::MAX_SAMPLE_AGE_SECS,
                watch_sample_age_seconds: constants::WATCH_SAMPLE_AGE_SECS,
                perimeter_cache_ttl_seconds: constants::PERIMETER_CACHE_TTL_SECS,
            },
        }
    }
}
