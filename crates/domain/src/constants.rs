//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Credential defaults
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 300;
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

// Reconciliation defaults
pub const DEFAULT_APPOINTMENT_DURATION_MINUTES: u32 = 50;
pub const DEFAULT_SYNC_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_TIME_ZONE: &str = "UTC";
pub const SESSION_TITLE_PREFIX: &str = "Session";
pub const UNTITLED_EVENT_TITLE: &str = "(no title)";

// Scheduler defaults
pub const DEFAULT_SYNC_CRON: &str = "0 */15 * * * *";
pub const DEFAULT_MAX_CONCURRENT_TENANTS: usize = 4;
pub const DEFAULT_BATCH_DEADLINE_SECS: u64 = 600;

// Provider endpoints
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
