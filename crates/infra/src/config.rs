//! Configuration loading and representation.
//!
//! Everything comes from environment variables; every variable is optional.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use thiserror::Error;

use rentwatch_core::{DomainError, Timezone};

use crate::jobs::DEFAULT_SCAN_TIMEOUT;

pub const DEFAULT_PORT: u16 = 3000;

/// Configuration error: a variable is set but its value is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Runtime configuration for the reminder service.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `BIND_HOST`, default `0.0.0.0`
    pub host: IpAddr,
    /// `PORT`, default `3000`
    pub port: u16,
    /// `REMINDER_NOTIFY_AT` (`HH:MM`), default `12:00`
    pub notify_at: NaiveTime,
    /// `REMINDER_SCHEDULE_TZ` (IANA name), default `UTC`
    pub schedule_timezone: Timezone,
    /// `REMINDER_SCAN_TIMEOUT_SECS`, default 300
    pub scan_timeout: Duration,
    /// `RENTWATCH_SEED_FILE`: JSON array of rentals to preload
    pub seed_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            notify_at: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default(),
            schedule_timezone: Timezone::utc(),
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            seed_file: None,
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to resolve variables. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = AppConfig::default();

        if let Some(raw) = get("BIND_HOST") {
            config.host = raw
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::invalid("BIND_HOST", &raw, e.to_string()))?;
        }
        if let Some(raw) = get("PORT") {
            config.port = raw
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::invalid("PORT", &raw, e.to_string()))?;
        }
        if let Some(raw) = get("REMINDER_NOTIFY_AT") {
            config.notify_at = NaiveTime::parse_from_str(&raw, "%H:%M")
                .map_err(|e| ConfigError::invalid("REMINDER_NOTIFY_AT", &raw, e.to_string()))?;
        }
        if let Some(raw) = get("REMINDER_SCHEDULE_TZ") {
            config.schedule_timezone = Timezone::parse(&raw).map_err(|e: DomainError| {
                ConfigError::invalid("REMINDER_SCHEDULE_TZ", &raw, e.to_string())
            })?;
        }
        if let Some(raw) = get("REMINDER_SCAN_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::invalid("REMINDER_SCAN_TIMEOUT_SECS", &raw, e.to_string())
            })?;
            if secs == 0 {
                return Err(ConfigError::invalid(
                    "REMINDER_SCAN_TIMEOUT_SECS",
                    &raw,
                    "must be at least 1",
                ));
            }
            config.scan_timeout = Duration::from_secs(secs);
        }
        config.seed_file = get("RENTWATCH_SEED_FILE").map(PathBuf::from);

        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
