//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SHIFTFENCE_DB_PATH`: Database file path
//! - `SHIFTFENCE_DB_POOL_SIZE`: Connection pool size
//! - `SHIFTFENCE_API_BASE_URL`: Collaborator API base URL
//! - `SHIFTFENCE_API_TIMEOUT_SECS`: Per-request API timeout in seconds
//! - `SHIFTFENCE_DEBOUNCE_MS`: Watch-mode sample debounce window (optional)
//! - `SHIFTFENCE_LOCATION_TIMEOUT_SECS`: Location acquisition timeout (optional)
//! - `SHIFTFENCE_MAX_SAMPLE_AGE_SECS`: Oldest accepted one-shot fix (optional)
//! - `SHIFTFENCE_WATCH_SAMPLE_AGE_SECS`: Oldest accepted watch fix (optional)
//! - `SHIFTFENCE_CACHE_TTL_SECS`: Active perimeter cache TTL (optional)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./shiftfence.json` or `./shiftfence.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use shiftfence_domain::config::{ApiConfig, DatabaseConfig, TrackingConfig};
use shiftfence_domain::{constants, Config, Result, ShiftFenceError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ShiftFenceError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `SHIFTFENCE_DB_PATH`, `SHIFTFENCE_DB_POOL_SIZE`, `SHIFTFENCE_API_BASE_URL`
/// and `SHIFTFENCE_API_TIMEOUT_SECS` are required; the tracking knobs fall
/// back to their built-in defaults.
///
/// # Errors
/// Returns `ShiftFenceError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("SHIFTFENCE_DB_PATH")?;
    let db_pool_size = env_var("SHIFTFENCE_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| ShiftFenceError::Config(format!("Invalid pool size: {}", e)))
    })?;

    let api_base_url = env_var("SHIFTFENCE_API_BASE_URL")?;
    let api_timeout = env_var("SHIFTFENCE_API_TIMEOUT_SECS").and_then(|s| {
        s.parse::<u64>().map_err(|e| ShiftFenceError::Config(format!("Invalid API timeout: {}", e)))
    })?;

    let debounce_ms = env_u64("SHIFTFENCE_DEBOUNCE_MS", constants::DEBOUNCE_WINDOW_MS)?;
    let location_timeout =
        env_u64("SHIFTFENCE_LOCATION_TIMEOUT_SECS", constants::LOCATION_TIMEOUT_SECS)?;
    let max_sample_age = env_u64("SHIFTFENCE_MAX_SAMPLE_AGE_SECS", constants::MAX_SAMPLE_AGE_SECS)?;
    let watch_sample_age =
        env_u64("SHIFTFENCE_WATCH_SAMPLE_AGE_SECS", constants::WATCH_SAMPLE_AGE_SECS)?;
    let cache_ttl = env_u64("SHIFTFENCE_CACHE_TTL_SECS", constants::PERIMETER_CACHE_TTL_SECS)?;

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        api: ApiConfig { base_url: api_base_url, timeout_seconds: api_timeout },
        tracking: TrackingConfig {
            debounce_ms,
            location_timeout_seconds: location_timeout,
            max_sample_age_seconds: max_sample_age,
            watch_sample_age_seconds: watch_sample_age,
            perimeter_cache_ttl_seconds: cache_ttl,
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ShiftFenceError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ShiftFenceError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ShiftFenceError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ShiftFenceError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format detected by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ShiftFenceError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ShiftFenceError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ShiftFenceError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, up to two parent levels, and the
/// executable's directory. Returns the first config file found.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("shiftfence.json"),
            cwd.join("shiftfence.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("shiftfence.json"),
                exe_dir.join("shiftfence.toml"),
                exe_dir.join("../config.json"),
                exe_dir.join("../config.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ShiftFenceError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric override, falling back to `default` when unset.
fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(s) => s
            .parse::<u64>()
            .map_err(|e| ShiftFenceError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
