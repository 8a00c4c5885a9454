//! Shared test helpers for `cadence-core` integration tests.
//!
//! In-memory implementations of every port so that reconciliation tests can
//! focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod calendar;
pub mod repositories;

use chrono::{DateTime, Duration, TimeZone, Utc};

use cadence_domain::{AppointmentStatus, LocalAppointment, OAuthCredential, TenantId};

/// Fixed "now" used across the suite: Monday 2025-06-09 08:00 UTC.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 9, 8, 0, 0).unwrap()
}

/// Credential whose access token is `token-{tenant}` and expires in an hour.
pub fn credential(tenant: &str, now: DateTime<Utc>) -> OAuthCredential {
    OAuthCredential::new(
        TenantId::from(tenant),
        format!("token-{tenant}"),
        format!("refresh-{tenant}"),
        now + Duration::hours(1),
    )
}

/// Scheduled appointment without a remote event yet.
pub fn appointment(id: &str, tenant: &str, starts_at: DateTime<Utc>) -> LocalAppointment {
    LocalAppointment {
        id: id.to_string(),
        tenant_id: TenantId::from(tenant),
        title: None,
        starts_at,
        duration_minutes: Some(50),
        status: AppointmentStatus::Scheduled,
        external_event_id: None,
        counterpart_name: "Ana Silva".to_string(),
        counterpart_email: Some("ana@example.com".to_string()),
        notes: None,
    }
}
