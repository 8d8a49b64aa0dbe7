use std::{env, path::PathBuf, time::Duration};

use crate::{DEFAULT_PENDING_PATH, error::TrackerError};

/// Runtime configuration, read from `ECOPASSO_*` environment variables.
/// Only the backend URL and API token are mandatory; everything else
/// has the production defaults.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub server_url: String,
    pub api_token: String,
    pub pending_path: PathBuf,
    /// No movement for this long ends the trip.
    pub idle_timeout: Duration,
    /// How often the inactivity check runs, independent of fix arrival.
    pub tick_interval: Duration,
    /// Rate limits for the location provider: a fix is emitted only
    /// after both the minimum displacement and the minimum time have
    /// passed. The replay driver enforces these; the session core
    /// itself never rate-limits.
    pub min_fix_distance_m: u32,
    pub min_fix_interval: Duration,
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, TrackerError> {
        let server_url = env::var("ECOPASSO_SERVER_URL")
            .map_err(|_| TrackerError::Config("ECOPASSO_SERVER_URL is not set".into()))?;
        let api_token = env::var("ECOPASSO_API_TOKEN")
            .map_err(|_| TrackerError::Config("ECOPASSO_API_TOKEN is not set".into()))?;

        let pending_path = env::var("ECOPASSO_PENDING_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PENDING_PATH));

        Ok(Self {
            server_url,
            api_token,
            pending_path,
            idle_timeout: duration_var("ECOPASSO_IDLE_TIMEOUT_SECS", 300)?,
            tick_interval: duration_var("ECOPASSO_TICK_INTERVAL_SECS", 60)?,
            min_fix_distance_m: u32_var("ECOPASSO_MIN_FIX_DISTANCE_M", 10)?,
            min_fix_interval: duration_var("ECOPASSO_MIN_FIX_INTERVAL_SECS", 5)?,
        })
    }
}

fn duration_var(name: &str, default_secs: u64) -> Result<Duration, TrackerError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|err| TrackerError::Config(format!("invalid {name}: {err}"))),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

fn u32_var(name: &str, default: u32) -> Result<u32, TrackerError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u32>()
            .map_err(|err| TrackerError::Config(format!("invalid {name}: {err}"))),
        Err(_) => Ok(default),
    }
}
