//! SQLite-backed implementation of the AppointmentRepository port.
//!
//! Appointments are created and edited by the booking side of the product;
//! the sync engine only reads them and writes back remote event ids.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::AppointmentRepository;
use cadence_domain::{CadenceError, LocalAppointment, Result, TenantId};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{column_parsed, column_time, map_join_error, map_sql_error, DbManager};

const APPOINTMENT_COLUMNS: &str = "id, tenant_id, title, starts_at, duration_minutes, status,
     external_event_id, counterpart_name, counterpart_email, notes";

/// SQLite implementation of AppointmentRepository
pub struct SqliteAppointmentRepository {
    db: Arc<DbManager>,
}

impl SqliteAppointmentRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace an appointment.
    pub async fn save_appointment(&self, appointment: &LocalAppointment) -> Result<()> {
        let db = Arc::clone(&self.db);
        let appointment = appointment.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO appointments (
                    id, tenant_id, title, starts_at, duration_minutes, status,
                    external_event_id, counterpart_name, counterpart_email, notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(id) DO UPDATE SET
                    tenant_id = excluded.tenant_id,
                    title = excluded.title,
                    starts_at = excluded.starts_at,
                    duration_minutes = excluded.duration_minutes,
                    status = excluded.status,
                    external_event_id = excluded.external_event_id,
                    counterpart_name = excluded.counterpart_name,
                    counterpart_email = excluded.counterpart_email,
                    notes = excluded.notes",
                params![
                    appointment.id,
                    appointment.tenant_id.as_str(),
                    appointment.title,
                    appointment.starts_at.timestamp(),
                    appointment.duration_minutes,
                    appointment.status.to_string(),
                    appointment.external_event_id,
                    appointment.counterpart_name,
                    appointment.counterpart_email,
                    appointment.notes,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    /// Fetch one appointment by id.
    pub async fn get_appointment(&self, appointment_id: &str) -> Result<Option<LocalAppointment>> {
        let db = Arc::clone(&self.db);
        let appointment_id = appointment_id.to_string();

        task::spawn_blocking(move || -> Result<Option<LocalAppointment>> {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
                params![appointment_id],
                Self::map_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<LocalAppointment> {
        Ok(LocalAppointment {
            id: row.get(0)?,
            tenant_id: TenantId::new(row.get::<_, String>(1)?),
            title: row.get(2)?,
            starts_at: column_time(row, 3)?,
            duration_minutes: row.get(4)?,
            status: column_parsed(row, 5)?,
            external_event_id: row.get(6)?,
            counterpart_name: row.get(7)?,
            counterpart_email: row.get(8)?,
            notes: row.get(9)?,
        })
    }

    async fn set_external_id(&self, appointment_id: &str, external_id: Option<String>) -> Result<()> {
        let db = Arc::clone(&self.db);
        let appointment_id = appointment_id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE appointments SET external_event_id = ?2 WHERE id = ?1",
                    params![appointment_id, external_id],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(CadenceError::NotFound(format!("appointment {appointment_id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepository {
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn list_eligible_appointments(
        &self,
        tenant_id: &TenantId,
        now: DateTime<Utc>,
    ) -> Result<Vec<LocalAppointment>> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.clone();

        task::spawn_blocking(move || -> Result<Vec<LocalAppointment>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments
                     WHERE tenant_id = ?1 AND status = 'scheduled' AND starts_at >= ?2
                     ORDER BY starts_at"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![tenant_id.as_str(), now.timestamp()], Self::map_row)
                .map_err(map_sql_error)?;
            let appointments =
                rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)?;
            debug!(count = appointments.len(), "loaded eligible appointments");
            Ok(appointments)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn list_linked_external_ids(&self, tenant_id: &TenantId) -> Result<HashSet<String>> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.clone();

        task::spawn_blocking(move || -> Result<HashSet<String>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT external_event_id FROM appointments
                     WHERE tenant_id = ?1 AND external_event_id IS NOT NULL AND external_event_id <> ''",
                )
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![tenant_id.as_str()], |row| row.get::<_, String>(0))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<HashSet<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn attach_external_id(&self, appointment_id: &str, external_id: &str) -> Result<()> {
        self.set_external_id(appointment_id, Some(external_id.to_string())).await
    }

    #[instrument(skip(self))]
    async fn detach_external_id(&self, appointment_id: &str) -> Result<()> {
        self.set_external_id(appointment_id, None).await
    }
}

#[cfg(test)]
mod tests {
    use cadence_domain::AppointmentStatus;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (TempDir, SqliteAppointmentRepository) {
        let dir = TempDir::new().unwrap();
        let db = DbManager::new(dir.path().join("cadence.db"), 2).unwrap();
        db.run_migrations().unwrap();
        (dir, SqliteAppointmentRepository::new(Arc::new(db)))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 9, 8, 0, 0).unwrap()
    }

    fn appointment(id: &str, tenant: &str, offset_hours: i64) -> LocalAppointment {
        LocalAppointment {
            id: id.into(),
            tenant_id: TenantId::from(tenant),
            title: None,
            starts_at: now() + Duration::hours(offset_hours),
            duration_minutes: Some(50),
            status: AppointmentStatus::Scheduled,
            external_event_id: None,
            counterpart_name: "Ana Silva".into(),
            counterpart_email: None,
            notes: Some("first visit".into()),
        }
    }

    #[tokio::test]
    async fn eligible_appointments_are_future_scheduled_for_tenant() {
        let (_dir, repo) = setup();
        let mut cancelled = appointment("cancelled", "clinic", 3);
        cancelled.status = AppointmentStatus::Cancelled;
        for appt in [
            appointment("later", "clinic", 5),
            appointment("soon", "clinic", 1),
            appointment("past", "clinic", -2),
            appointment("other-tenant", "other", 1),
            cancelled,
        ] {
            repo.save_appointment(&appt).await.unwrap();
        }

        let eligible =
            repo.list_eligible_appointments(&TenantId::from("clinic"), now()).await.unwrap();

        let ids: Vec<_> = eligible.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["soon", "later"]);
        assert_eq!(eligible[0].notes.as_deref(), Some("first visit"));
    }

    #[tokio::test]
    async fn attach_and_detach_external_id() {
        let (_dir, repo) = setup();
        let mut past = appointment("past", "clinic", -24);
        past.external_event_id = Some("remote-old".into());
        repo.save_appointment(&past).await.unwrap();
        repo.save_appointment(&appointment("appt-1", "clinic", 2)).await.unwrap();

        repo.attach_external_id("appt-1", "remote-1").await.unwrap();

        let linked = repo.list_linked_external_ids(&TenantId::from("clinic")).await.unwrap();
        assert_eq!(linked, HashSet::from(["remote-1".to_string(), "remote-old".to_string()]));

        repo.detach_external_id("appt-1").await.unwrap();
        let stored = repo.get_appointment("appt-1").await.unwrap().unwrap();
        assert_eq!(stored.external_event_id, None);
    }

    #[tokio::test]
    async fn attaching_unknown_appointment_is_not_found() {
        let (_dir, repo) = setup();
        let err = repo.attach_external_id("missing", "remote-1").await.unwrap_err();
        assert!(matches!(err, CadenceError::NotFound(_)));
    }
}
