//! Service configuration read from environment variables.
//!
//! - `SLOTSWAP_DB_PATH`: SQLite database file path (default: in-memory)
//! - `SLOTSWAP_LOCK_TTL_SECS`: slot lease TTL in whole seconds (default: 30)

use std::time::Duration;

use thiserror::Error;

pub const DB_PATH_VAR: &str = "SLOTSWAP_DB_PATH";
pub const LOCK_TTL_VAR: &str = "SLOTSWAP_LOCK_TTL_SECS";

const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);

/// A configuration variable held an unusable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for [`ExchangeService::open`](crate::ExchangeService::open).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// SQLite file to open; `None` keeps everything in memory.
    pub db_path: Option<String>,
    /// How long a batch may hold its slot leases.
    pub lock_ttl: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            db_path: None,
            lock_ttl: DEFAULT_LOCK_TTL,
        }
    }
}

impl ExchangeConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults for
    /// unset or blank variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let lock_ttl = match read(LOCK_TTL_VAR) {
            Some(value) => parse_ttl(&value)?,
            None => DEFAULT_LOCK_TTL,
        };

        Ok(ExchangeConfig {
            db_path: read(DB_PATH_VAR),
            lock_ttl,
        })
    }
}

fn parse_ttl(value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        var: LOCK_TTL_VAR,
        value: value.to_string(),
        reason,
    };

    match value.trim().parse::<u64>() {
        Ok(0) => Err(invalid("lease TTL must be at least one second".to_string())),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(err) => Err(invalid(err.to_string())),
    }
}
