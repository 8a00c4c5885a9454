//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If required variables are missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `CADENCE_DB_PATH`: Database file path
//! - `CADENCE_OAUTH_CLIENT_ID`: OAuth client id
//! - `CADENCE_OAUTH_CLIENT_SECRET`: OAuth client secret
//!
//! Optional (defaults in parentheses):
//! - `CADENCE_DB_POOL_SIZE` (8)
//! - `CADENCE_OAUTH_TOKEN_ENDPOINT` (Google token endpoint)
//! - `CADENCE_TOKEN_REFRESH_THRESHOLD`: seconds before expiry (300)
//! - `CADENCE_HTTP_TIMEOUT`: request timeout in seconds for both APIs (30)
//! - `CADENCE_CALENDAR_API_BASE` (Google Calendar v3)
//! - `CADENCE_CALENDAR_TIME_ZONE` (UTC)
//! - `CADENCE_SYNC_ENABLED` (true)
//! - `CADENCE_SYNC_CRON` (every 15 minutes)
//! - `CADENCE_SYNC_WINDOW_DAYS` (30)
//! - `CADENCE_SYNC_DEFAULT_DURATION`: appointment minutes (50)
//! - `CADENCE_SYNC_MAX_CONCURRENT` (4)
//! - `CADENCE_SYNC_DEADLINE`: batch deadline in seconds, 0 disables (600)
//! - `CADENCE_MANUAL_PROJECTION`: `blocked_range` or `classified`
//! - `CADENCE_LOG_FILTER`, `CADENCE_LOG_FORMAT` (`pretty` or `json`)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./cadence.toml`, `./cadence.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use cadence_domain::{
    CadenceError, CalendarApiConfig, Config, DatabaseConfig, LogFormat, LoggingConfig,
    ManualProjection, OAuthConfig, Result, SyncConfig,
};

const CONFIG_FILE_NAMES: &[&str] = &["cadence.toml", "cadence.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `CadenceError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
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
/// # Errors
/// Returns `CadenceError::Config` if required variables are missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();
    let http_timeout = env_parse("CADENCE_HTTP_TIMEOUT", defaults.oauth.request_timeout_seconds)?;

    Ok(Config {
        database: DatabaseConfig {
            path: env_var("CADENCE_DB_PATH")?,
            pool_size: env_parse("CADENCE_DB_POOL_SIZE", defaults.database.pool_size)?,
        },
        oauth: OAuthConfig {
            client_id: env_var("CADENCE_OAUTH_CLIENT_ID")?,
            client_secret: env_var("CADENCE_OAUTH_CLIENT_SECRET")?,
            token_endpoint: env_or("CADENCE_OAUTH_TOKEN_ENDPOINT", defaults.oauth.token_endpoint),
            refresh_threshold_seconds: env_parse(
                "CADENCE_TOKEN_REFRESH_THRESHOLD",
                defaults.oauth.refresh_threshold_seconds,
            )?,
            request_timeout_seconds: http_timeout,
        },
        calendar: CalendarApiConfig {
            base_url: env_or("CADENCE_CALENDAR_API_BASE", defaults.calendar.base_url),
            time_zone: env_or("CADENCE_CALENDAR_TIME_ZONE", defaults.calendar.time_zone),
            request_timeout_seconds: http_timeout,
        },
        sync: SyncConfig {
            enabled: env_bool("CADENCE_SYNC_ENABLED", defaults.sync.enabled),
            cron_expression: env_or("CADENCE_SYNC_CRON", defaults.sync.cron_expression),
            window_days: env_parse("CADENCE_SYNC_WINDOW_DAYS", defaults.sync.window_days)?,
            default_duration_minutes: env_parse(
                "CADENCE_SYNC_DEFAULT_DURATION",
                defaults.sync.default_duration_minutes,
            )?,
            max_concurrent_tenants: env_parse(
                "CADENCE_SYNC_MAX_CONCURRENT",
                defaults.sync.max_concurrent_tenants,
            )?,
            batch_deadline_seconds: env_parse(
                "CADENCE_SYNC_DEADLINE",
                defaults.sync.batch_deadline_seconds,
            )?,
            manual_projection: match std::env::var("CADENCE_MANUAL_PROJECTION").ok().as_deref() {
                None => defaults.sync.manual_projection,
                Some(value) => parse_manual_projection(value)?,
            },
        },
        logging: LoggingConfig {
            filter: env_or("CADENCE_LOG_FILTER", defaults.logging.filter),
            format: match std::env::var("CADENCE_LOG_FORMAT").ok().as_deref() {
                None => defaults.logging.format,
                Some(value) => parse_log_format(value)?,
            },
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CadenceError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CadenceError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CadenceError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CadenceError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(CadenceError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn parse_manual_projection(value: &str) -> Result<ManualProjection> {
    match value.to_ascii_lowercase().as_str() {
        "blocked_range" | "blocked" => Ok(ManualProjection::BlockedRange),
        "classified" => Ok(ManualProjection::Classified),
        other => Err(CadenceError::Config(format!("Invalid manual projection: {other}"))),
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat> {
    match value.to_ascii_lowercase().as_str() {
        "pretty" | "text" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(CadenceError::Config(format!("Invalid log format: {other}"))),
    }
}

/// Get required environment variable
///
/// # Errors
/// Returns `CadenceError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| CadenceError::Config(format!("Missing required environment variable: {key}")))
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Parse an optional environment variable, using `default` when unset.
///
/// # Errors
/// Returns `CadenceError::Config` if the variable is set but unparseable.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| CadenceError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
