//! Tenant identity and OAuth credential records

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CALENDAR_ID;

/// Stable identifier of an account owning appointments and one calendar
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Persisted OAuth credential for one tenant.
///
/// Both tokens are secrets; the `Debug` implementation never prints them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthCredential {
    pub tenant_id: TenantId,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub calendar_id: String,
    pub sync_enabled: bool,
    /// Set when the provider rejected the refresh token; cleared on reconnect.
    pub needs_reconnect: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl OAuthCredential {
    /// Freshly connected credential on the primary calendar, sync enabled.
    pub fn new(
        tenant_id: TenantId,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            sync_enabled: true,
            needs_reconnect: false,
            last_synced_at: None,
        }
    }

    /// True when `now` is inside the refresh threshold before expiry.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now >= self.expires_at - threshold
    }

    /// Expiry instant for a token issued at `now` that lives `expires_in`
    /// seconds. `None` when the lifetime does not fit a timestamp.
    #[must_use]
    pub fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
        Duration::try_seconds(expires_in).and_then(|lifetime| now.checked_add_signed(lifetime))
    }
}

impl fmt::Debug for OAuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredential")
            .field("tenant_id", &self.tenant_id)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("calendar_id", &self.calendar_id)
            .field("sync_enabled", &self.sync_enabled)
            .field("needs_reconnect", &self.needs_reconnect)
            .field("last_synced_at", &self.last_synced_at)
            .finish()
    }
}

/// A usable access token plus the calendar it applies to.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub access_token: String,
    pub calendar_id: String,
}

impl fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGrant")
            .field("access_token", &"<redacted>")
            .field("calendar_id", &self.calendar_id)
            .finish()
    }
}

/// Result of a refresh-token exchange with the OAuth provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: i64,
    /// Present when the provider rotates refresh tokens.
    pub refresh_token: Option<String>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("rotated_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Connection status reported to callers of the trigger surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarStatus {
    pub tenant_id: TenantId,
    pub connected: bool,
    pub sync_enabled: bool,
    pub needs_reconnect: bool,
    pub calendar_id: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}
