//! Configuration management
//!
//! Every collaborator receives the slice of configuration it needs at
//! construction time; nothing reads the process environment after the
//! loader has run.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_APPOINTMENT_DURATION_MINUTES, DEFAULT_BATCH_DEADLINE_SECS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_MAX_CONCURRENT_TENANTS, DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_SYNC_CRON,
    DEFAULT_SYNC_WINDOW_DAYS, DEFAULT_TIME_ZONE, GOOGLE_CALENDAR_API_BASE, GOOGLE_TOKEN_ENDPOINT,
};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub oauth: OAuthConfig,
    pub calendar: CalendarApiConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "cadence.db".to_string(), pool_size: 8 }
    }
}

/// OAuth client registration used for refresh-token exchanges
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub token_endpoint: String,
    /// Refresh this many seconds before the access token expires.
    pub refresh_threshold_seconds: i64,
    pub request_timeout_seconds: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            refresh_threshold_seconds: DEFAULT_REFRESH_THRESHOLD_SECS,
            request_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Remote calendar API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarApiConfig {
    pub base_url: String,
    /// IANA zone attached to pushed events and used for all-day boundaries.
    pub time_zone: String,
    pub request_timeout_seconds: u64,
}

impl Default for CalendarApiConfig {
    fn default() -> Self {
        Self {
            base_url: GOOGLE_CALENDAR_API_BASE.to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            request_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Which record shape the on-demand trigger writes for foreign events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualProjection {
    #[default]
    BlockedRange,
    Classified,
}

/// Sync engine and scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub cron_expression: String,
    pub window_days: u32,
    pub default_duration_minutes: u32,
    pub max_concurrent_tenants: usize,
    /// Tenants not started before this many seconds are skipped; 0 disables.
    pub batch_deadline_seconds: u64,
    pub manual_projection: ManualProjection,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_expression: DEFAULT_SYNC_CRON.to_string(),
            window_days: DEFAULT_SYNC_WINDOW_DAYS,
            default_duration_minutes: DEFAULT_APPOINTMENT_DURATION_MINUTES,
            max_concurrent_tenants: DEFAULT_MAX_CONCURRENT_TENANTS,
            batch_deadline_seconds: DEFAULT_BATCH_DEADLINE_SECS,
            manual_projection: ManualProjection::default(),
        }
    }
}

/// Log output format for the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "info,cadence=debug".to_string(), format: LogFormat::default() }
    }
}
