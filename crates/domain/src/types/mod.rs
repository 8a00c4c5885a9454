//! Domain types and models
//!
//! Explicit records for every entity the sync engine touches. Required fields
//! are plain values; `Option` is used only where the data is genuinely absent
//! for some records.

pub mod appointment;
pub mod calendar;
pub mod sync;
pub mod tenant;

pub use appointment::{AppointmentStatus, LocalAppointment};
pub use calendar::{
    BlockedTimeRange, EventDraft, EventTag, EventTime, ForeignEvent, ImportedExternalEvent,
    RemoteEvent, TimeWindow, UpsertOutcome,
};
pub use sync::{BatchSummary, EventFailure, ManualSyncResult, SyncRun, TenantFailure};
pub use tenant::{AccessGrant, CalendarStatus, OAuthCredential, TenantId, TokenGrant};
