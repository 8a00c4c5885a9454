//! Remote calendar events and the local records derived from them

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::tenant::TenantId;
use crate::impl_domain_status_conversions;

/// Start or end of a remote event: an instant, or a whole day for all-day
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    #[must_use]
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// Event as listed by the remote calendar, recurring series already expanded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub color_id: Option<String>,
}

impl RemoteEvent {
    #[must_use]
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }
}

/// Full-replace payload for creating or updating a remote event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub summary: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// IANA zone name sent alongside both instants.
    pub time_zone: String,
    pub attendee_email: Option<String>,
}

/// Half-open fetch window `[start, end)` for listing remote events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of `days` days beginning at `now`.
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>, days: u32) -> Self {
        Self { start: now, end: now + Duration::days(i64::from(days)) }
    }
}

/// Category assigned to imported events from their title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    Meeting,
    Personal,
    Focus,
    Travel,
    Default,
}

impl_domain_status_conversions!(EventTag {
    Meeting => "meeting",
    Personal => "personal",
    Focus => "focus",
    Travel => "travel",
    Default => "default",
});

/// Remote event not originated by this system, normalized to concrete
/// instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignEvent {
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub all_day: bool,
    pub color_id: Option<String>,
}

/// Classified copy of a foreign event, tracked for stale cleanup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedExternalEvent {
    pub tenant_id: TenantId,
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub all_day: bool,
    pub tag: EventTag,
    pub color_id: Option<String>,
}

/// Untagged blocking record written by the on-demand trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedTimeRange {
    pub tenant_id: TenantId,
    pub external_id: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub all_day: bool,
}

/// Whether an identifier-keyed upsert created or replaced a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
