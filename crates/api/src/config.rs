//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use domain::ReservationTtl;
use inventory::{AlertDedupPolicy, EngineSettings};

/// Server and engine configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` (default `"0.0.0.0"`), `PORT` (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DATABASE_URL`: PostgreSQL ledger; in-memory when unset
/// - `RESERVATION_TTL_HOURS`: default hold time, clamped to 1..=168 (default `24`)
/// - `EXPIRY_SWEEP_INTERVAL_SECS` / `EXPIRY_SWEEP_BATCH_SIZE` (default `60` / `100`)
/// - `ALERT_SCAN_INTERVAL_SECS` / `ALERT_SCAN_BATCH_SIZE` (default `900` / `100`)
/// - `ALERT_DEDUP`: `cumulative` or `skip_unresolved` (default `cumulative`)
/// - `RATE_LIMIT_MAX_REQUESTS` / `RATE_LIMIT_WINDOW_SECS` (default `120` / `60`)
///
/// Unparseable values fall back to their default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub reservation_ttl: ReservationTtl,
    pub sweep_interval_secs: u64,
    pub sweep_batch_size: usize,
    pub alert_scan_interval_secs: u64,
    pub alert_scan_batch_size: usize,
    pub alert_dedup: AlertDedupPolicy,
    pub rate_limit_max_requests: u64,
    pub rate_limit_window_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            reservation_ttl: parse(&lookup, "RESERVATION_TTL_HOURS")
                .map(ReservationTtl::clamped)
                .unwrap_or(defaults.reservation_ttl),
            sweep_interval_secs: positive(parse(&lookup, "EXPIRY_SWEEP_INTERVAL_SECS"))
                .unwrap_or(defaults.sweep_interval_secs),
            sweep_batch_size: positive(parse(&lookup, "EXPIRY_SWEEP_BATCH_SIZE"))
                .unwrap_or(defaults.sweep_batch_size),
            alert_scan_interval_secs: positive(parse(&lookup, "ALERT_SCAN_INTERVAL_SECS"))
                .unwrap_or(defaults.alert_scan_interval_secs),
            alert_scan_batch_size: positive(parse(&lookup, "ALERT_SCAN_BATCH_SIZE"))
                .unwrap_or(defaults.alert_scan_batch_size),
            alert_dedup: lookup("ALERT_DEDUP")
                .and_then(|v| AlertDedupPolicy::from_str(v.trim()).ok())
                .unwrap_or(defaults.alert_dedup),
            rate_limit_max_requests: positive(parse(&lookup, "RATE_LIMIT_MAX_REQUESTS"))
                .unwrap_or(defaults.rate_limit_max_requests),
            rate_limit_window_secs: positive(parse(&lookup, "RATE_LIMIT_WINDOW_SECS"))
                .unwrap_or(defaults.rate_limit_window_secs),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            default_ttl: self.reservation_ttl,
            alert_dedup: self.alert_dedup,
            alert_batch_size: self.alert_scan_batch_size,
            sweep_batch_size: self.sweep_batch_size,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn alert_scan_interval(&self) -> Duration {
        Duration::from_secs(self.alert_scan_interval_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn positive<T: Default + PartialOrd>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v > T::default())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            reservation_ttl: ReservationTtl::default(),
            sweep_interval_secs: 60,
            sweep_batch_size: 100,
            alert_scan_interval_secs: 900,
            alert_scan_batch_size: 100,
            alert_dedup: AlertDedupPolicy::default(),
            rate_limit_max_requests: 120,
            rate_limit_window_secs: 60,
        }
    }
}
