//! Local appointment records owned by the booking collaborator

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::tenant::TenantId;
use crate::impl_domain_status_conversions;

/// Lifecycle state of a booked appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl_domain_status_conversions!(AppointmentStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no_show",
});

/// Appointment as seen by the sync engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAppointment {
    pub id: String,
    pub tenant_id: TenantId,
    /// Explicit event title; when absent a session title is derived.
    pub title: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub status: AppointmentStatus,
    /// Remote event id, empty until the first successful push.
    pub external_event_id: Option<String>,
    pub counterpart_name: String,
    pub counterpart_email: Option<String>,
    pub notes: Option<String>,
}

impl LocalAppointment {
    /// Only future scheduled appointments are written to the remote calendar.
    #[must_use]
    pub fn is_eligible_for_push(&self, now: DateTime<Utc>) -> bool {
        self.status == AppointmentStatus::Scheduled && self.starts_at >= now
    }

    /// Duration, falling back to `default_minutes` when unset or zero.
    #[must_use]
    pub fn effective_duration(&self, default_minutes: u32) -> Duration {
        let minutes = self.duration_minutes.filter(|m| *m > 0).unwrap_or(default_minutes);
        Duration::minutes(i64::from(minutes))
    }

    #[must_use]
    pub fn ends_at(&self, default_minutes: u32) -> DateTime<Utc> {
        self.starts_at + self.effective_duration(default_minutes)
    }
}
