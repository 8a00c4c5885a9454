//! Push/pull reconciliation for one tenant and one pass
//!
//! The engine holds no per-tenant state. Push writes local appointments to
//! the remote calendar; pull separates echoes of our own pushes from foreign
//! events and hands the foreign ones to a [`PullProjection`].

use std::collections::HashSet;

use cadence_domain::constants::{SESSION_TITLE_PREFIX, UNTITLED_EVENT_TITLE};
use cadence_domain::{
    AccessGrant, CadenceError, Config, EventDraft, EventFailure, EventTime, ForeignEvent,
    LocalAppointment, RemoteEvent, Result, TenantId, TimeWindow, UpsertOutcome,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::calendar_ports::RemoteCalendar;
use crate::sync::ports::AppointmentRepository;
use crate::sync::projection::PullProjection;

/// Result of the push phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOutcome {
    pub created: usize,
    pub updated: usize,
    /// Candidates that were not scheduled or already started
    pub skipped: usize,
    /// Identifiers returned by `create_event` during this pass, including any
    /// whose write-back failed
    pub minted_ids: Vec<String>,
    pub failures: Vec<EventFailure>,
}

/// Remote events split into echoes of our pushes and foreign events
#[derive(Debug, Clone, Default)]
pub struct PullPartition {
    pub foreign: Vec<RemoteEvent>,
    pub echoes: usize,
    /// Repeated or empty identifiers dropped from the fetch
    pub dropped: usize,
}

/// Result of the pull phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub echoes_skipped: usize,
    pub failures: Vec<EventFailure>,
}

impl PullOutcome {
    /// Foreign events written this pass, new or updated
    #[must_use]
    pub fn imported(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Reconciliation engine shared by the batch and on-demand triggers
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    time_zone: Tz,
    default_duration_minutes: u32,
}

impl ReconciliationEngine {
    #[must_use]
    pub fn new(time_zone: Tz, default_duration_minutes: u32) -> Self {
        Self { time_zone, default_duration_minutes }
    }

    /// Build from `calendar.time_zone` and `sync.default_duration_minutes`.
    ///
    /// # Errors
    /// Returns `Config` when the time zone is not a known IANA name.
    pub fn from_config(config: &Config) -> Result<Self> {
        let time_zone = config.calendar.time_zone.parse::<Tz>().map_err(|err| {
            CadenceError::Config(format!(
                "invalid calendar time zone '{}': {err}",
                config.calendar.time_zone
            ))
        })?;
        Ok(Self::new(time_zone, config.sync.default_duration_minutes))
    }

    #[must_use]
    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// Event body for an appointment.
    #[must_use]
    pub fn build_draft(&self, appointment: &LocalAppointment) -> EventDraft {
        let summary = match non_blank(appointment.title.as_deref()) {
            Some(title) => title.to_string(),
            None => match non_blank(Some(&appointment.counterpart_name)) {
                Some(name) => format!("{SESSION_TITLE_PREFIX} — {name}"),
                None => SESSION_TITLE_PREFIX.to_string(),
            },
        };

        EventDraft {
            summary,
            description: non_blank(appointment.notes.as_deref()).map(str::to_string),
            starts_at: appointment.starts_at,
            ends_at: appointment.ends_at(self.default_duration_minutes),
            time_zone: self.time_zone.name().to_string(),
            attendee_email: non_blank(appointment.counterpart_email.as_deref()).map(str::to_string),
        }
    }

    /// Push phase: create or update one remote event per eligible appointment.
    ///
    /// A failing appointment is recorded and the loop moves on.
    pub async fn push(
        &self,
        remote: &dyn RemoteCalendar,
        grant: &AccessGrant,
        appointments: &dyn AppointmentRepository,
        candidates: &[LocalAppointment],
        now: DateTime<Utc>,
    ) -> PushOutcome {
        let mut outcome = PushOutcome::default();

        for appointment in candidates {
            if !appointment.is_eligible_for_push(now) {
                debug!(appointment_id = %appointment.id, status = %appointment.status, "Skipping ineligible appointment");
                outcome.skipped += 1;
                continue;
            }

            let draft = self.build_draft(appointment);
            match non_blank(appointment.external_event_id.as_deref()) {
                None => match remote.create_event(grant, &draft).await {
                    Ok(external_id) => {
                        outcome.created += 1;
                        outcome.minted_ids.push(external_id.clone());
                        if let Err(err) =
                            appointments.attach_external_id(&appointment.id, &external_id).await
                        {
                            warn!(appointment_id = %appointment.id, external_id = %external_id, error = %err, "Failed to attach external id");
                            outcome.failures.push(EventFailure::new(&appointment.id, err));
                        }
                    }
                    Err(err) => {
                        warn!(appointment_id = %appointment.id, error = %err, "Failed to create remote event");
                        outcome.failures.push(EventFailure::new(&appointment.id, err));
                    }
                },
                Some(external_id) => match remote.update_event(grant, external_id, &draft).await {
                    Ok(()) => outcome.updated += 1,
                    Err(err) => {
                        warn!(appointment_id = %appointment.id, external_id = %external_id, error = %err, "Failed to update remote event");
                        outcome.failures.push(EventFailure::new(&appointment.id, err));
                    }
                },
            }
        }

        outcome
    }

    /// Split a fetch into echoes (ids in `ours`) and foreign events.
    ///
    /// Foreign events keep fetch order; a repeated identifier keeps its first
    /// occurrence.
    #[must_use]
    pub fn partition(&self, events: Vec<RemoteEvent>, ours: &HashSet<String>) -> PullPartition {
        let mut partition = PullPartition::default();
        let mut seen = HashSet::new();

        for event in events {
            if event.id.is_empty() {
                partition.dropped += 1;
            } else if ours.contains(&event.id) {
                partition.echoes += 1;
            } else if seen.insert(event.id.clone()) {
                partition.foreign.push(event);
            } else {
                partition.dropped += 1;
            }
        }

        partition
    }

    /// True when the event starts inside `window`.
    ///
    /// Timed events compare exact instants. All-day events compare calendar
    /// days in the engine's time zone, so today's all-day event is kept.
    #[must_use]
    pub fn starts_within(&self, event: &RemoteEvent, window: &TimeWindow) -> bool {
        match event.start {
            EventTime::DateTime(start) => start >= window.start && start <= window.end,
            EventTime::Date(day) => {
                let first = window.start.with_timezone(&self.time_zone).date_naive();
                let last = window.end.with_timezone(&self.time_zone).date_naive();
                day >= first && day <= last
            }
        }
    }

    /// Normalize a remote event to concrete instants.
    ///
    /// All-day events span 00:00:00 of the first day to 23:59:59 of the last
    /// covered day in the engine's time zone. The provider's end date is
    /// exclusive.
    #[must_use]
    pub fn to_foreign_event(&self, event: &RemoteEvent) -> ForeignEvent {
        let (starts_at, ends_at, all_day) = match (&event.start, &event.end) {
            (EventTime::Date(first), end) => {
                let last = match end {
                    EventTime::Date(exclusive_end) if exclusive_end > first => {
                        exclusive_end.pred_opt().unwrap_or(*first)
                    }
                    _ => *first,
                };
                (
                    self.local_instant(*first, NaiveTime::MIN),
                    self.local_instant(last, end_of_day()),
                    true,
                )
            }
            (EventTime::DateTime(start), EventTime::DateTime(end)) => (*start, (*end).max(*start), false),
            (EventTime::DateTime(start), EventTime::Date(_)) => (*start, *start, false),
        };

        ForeignEvent {
            external_id: event.id.clone(),
            title: non_blank(event.summary.as_deref()).unwrap_or(UNTITLED_EVENT_TITLE).to_string(),
            description: non_blank(event.description.as_deref()).map(str::to_string),
            starts_at,
            ends_at,
            all_day,
            color_id: event.color_id.clone(),
        }
    }

    /// Pull phase: write foreign events through `projection`, then let it
    /// remove records absent from this fetch.
    pub async fn pull(
        &self,
        tenant_id: &TenantId,
        events: Vec<RemoteEvent>,
        ours: &HashSet<String>,
        projection: &dyn PullProjection,
    ) -> PullOutcome {
        let partition = self.partition(events, ours);
        let mut outcome =
            PullOutcome { echoes_skipped: partition.echoes, ..PullOutcome::default() };
        if partition.dropped > 0 {
            debug!(tenant_id = %tenant_id, dropped = partition.dropped, "Dropped repeated or unkeyed remote events");
        }

        let current_ids: HashSet<String> =
            partition.foreign.iter().map(|event| event.id.clone()).collect();

        for event in &partition.foreign {
            let foreign = self.to_foreign_event(event);
            match projection.write(tenant_id, &foreign).await {
                Ok(UpsertOutcome::Inserted) => outcome.inserted += 1,
                Ok(UpsertOutcome::Updated) => outcome.updated += 1,
                Err(err) => {
                    warn!(tenant_id = %tenant_id, external_id = %event.id, projection = projection.name(), error = %err, "Failed to write foreign event");
                    outcome.failures.push(EventFailure::new(&event.id, err));
                }
            }
        }

        match projection.remove_stale(tenant_id, &current_ids).await {
            Ok(deleted) => outcome.deleted = deleted,
            Err(err) => {
                warn!(tenant_id = %tenant_id, projection = projection.name(), error = %err, "Stale cleanup failed");
                outcome.failures.push(EventFailure::new("stale-cleanup", err));
            }
        }

        outcome
    }

    fn local_instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        self.time_zone
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| self.time_zone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
            .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc))
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
