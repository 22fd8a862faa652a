//! Configuration loader for the `sensorflow-hourly` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::TimeDelta;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_num {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Hourly rows kept per variable: 30 days at one row per hour.
pub const DEFAULT_HOURLY_CAPACITY: u64 = 24 * 30;

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// SQLite connection string, e.g. `sqlite://sensorflow.db?mode=rwc`.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Hourly observations kept per variable before the oldest are evicted.
    pub hourly_capacity: u64,

    /// How far back the reconciler looks for unaggregated hours.
    pub reconcile_lookback_hours: u32,

    /// Seconds between reconciler sweeps; 0 disables the background sweep.
    pub reconcile_interval_secs: u64,

    /// TCP port for the HTTP surface.
    pub bind_port: u16,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – SQLite connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `HOURLY_CAPACITY` – hourly rows kept per variable (default: 720)
/// - `RECONCILE_LOOKBACK_HOURS` – reconciler window (default: 24)
/// - `RECONCILE_INTERVAL_SECS` – reconciler period (default: 300, 0 = off)
/// - `BIND_PORT` – HTTP port (default: 8080)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_num!("DB_POOL_MAX", u32, 5);
    let hourly_capacity = parse_env_num!("HOURLY_CAPACITY", u64, DEFAULT_HOURLY_CAPACITY);
    let reconcile_lookback_hours = parse_env_num!("RECONCILE_LOOKBACK_HOURS", u32, 24);
    let reconcile_interval_secs = parse_env_num!("RECONCILE_INTERVAL_SECS", u64, 300);
    let bind_port = parse_env_num!("BIND_PORT", u16, 8080);

    if db_pool_max == 0 {
        return Err(anyhow!("Invalid DB_POOL_MAX: must be at least 1"));
    }

    Ok(Config {
        db_url,
        db_pool_max,
        hourly_capacity,
        reconcile_lookback_hours,
        reconcile_interval_secs,
        bind_port,
    })
}

impl Config {
    // ---
    pub fn reconcile_lookback(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.reconcile_lookback_hours))
    }

    /// `None` when the background sweep is disabled.
    pub fn reconcile_interval(&self) -> Option<Duration> {
        (self.reconcile_interval_secs > 0).then(|| Duration::from_secs(self.reconcile_interval_secs))
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL             : {}", self.db_url);
        tracing::info!("  DB_POOL_MAX              : {}", self.db_pool_max);
        tracing::info!("  HOURLY_CAPACITY          : {}", self.hourly_capacity);
        tracing::info!("  RECONCILE_LOOKBACK_HOURS : {}", self.reconcile_lookback_hours);
        tracing::info!("  RECONCILE_INTERVAL_SECS  : {}", self.reconcile_interval_secs);
        tracing::info!("  BIND_PORT                : {}", self.bind_port);
    }
}
