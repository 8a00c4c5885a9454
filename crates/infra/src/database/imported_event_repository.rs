//! SQLite-backed implementation of the ImportedEventRepository port.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::ImportedEventRepository;
use cadence_domain::{ImportedExternalEvent, Result, TenantId, UpsertOutcome};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{column_parsed, column_time, map_join_error, map_sql_error, DbManager};

/// SQLite implementation of ImportedEventRepository
pub struct SqliteImportedEventRepository {
    db: Arc<DbManager>,
}

impl SqliteImportedEventRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ImportedExternalEvent> {
        Ok(ImportedExternalEvent {
            tenant_id: TenantId::new(row.get::<_, String>(0)?),
            external_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            starts_at: column_time(row, 4)?,
            ends_at: column_time(row, 5)?,
            all_day: row.get(6)?,
            tag: column_parsed(row, 7)?,
            color_id: row.get(8)?,
        })
    }
}

/// Whether `(tenant_id, external_id)` already has a row in `table`.
pub(crate) fn row_exists(
    conn: &Connection,
    table: &str,
    tenant_id: &str,
    external_id: &str,
) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!("SELECT 1 FROM {table} WHERE tenant_id = ?1 AND external_id = ?2"),
        params![tenant_id, external_id],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

#[async_trait]
impl ImportedEventRepository for SqliteImportedEventRepository {
    #[instrument(skip(self, event), fields(tenant_id = %event.tenant_id, external_id = %event.external_id))]
    async fn upsert_imported_event(&self, event: &ImportedExternalEvent) -> Result<UpsertOutcome> {
        let db = Arc::clone(&self.db);
        let event = event.clone();

        task::spawn_blocking(move || -> Result<UpsertOutcome> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let existed =
                row_exists(&tx, "imported_events", event.tenant_id.as_str(), &event.external_id)
                    .map_err(map_sql_error)?;

            tx.execute(
                "INSERT INTO imported_events (
                    tenant_id, external_id, title, description, starts_at, ends_at,
                    all_day, tag, color_id, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, CAST(strftime('%s','now') AS INTEGER))
                ON CONFLICT(tenant_id, external_id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    starts_at = excluded.starts_at,
                    ends_at = excluded.ends_at,
                    all_day = excluded.all_day,
                    tag = excluded.tag,
                    color_id = excluded.color_id,
                    updated_at = excluded.updated_at",
                params![
                    event.tenant_id.as_str(),
                    event.external_id,
                    event.title,
                    event.description,
                    event.starts_at.timestamp(),
                    event.ends_at.timestamp(),
                    event.all_day,
                    event.tag.to_string(),
                    event.color_id,
                ],
            )
            .map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;

            Ok(if existed { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn list_imported_external_ids(&self, tenant_id: &TenantId) -> Result<HashSet<String>> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.clone();

        task::spawn_blocking(move || -> Result<HashSet<String>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare("SELECT external_id FROM imported_events WHERE tenant_id = ?1")
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![tenant_id.as_str()], |row| row.get::<_, String>(0))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<HashSet<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, external_ids), fields(tenant_id = %tenant_id, count = external_ids.len()))]
    async fn delete_imported_events(
        &self,
        tenant_id: &TenantId,
        external_ids: &[String],
    ) -> Result<usize> {
        if external_ids.is_empty() {
            return Ok(0);
        }

        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.clone();
        let external_ids = external_ids.to_vec();

        task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let mut removed = 0;
            {
                let mut stmt = tx
                    .prepare(
                        "DELETE FROM imported_events WHERE tenant_id = ?1 AND external_id = ?2",
                    )
                    .map_err(map_sql_error)?;
                for external_id in &external_ids {
                    removed += stmt
                        .execute(params![tenant_id.as_str(), external_id])
                        .map_err(map_sql_error)?;
                }
            }
            tx.commit().map_err(map_sql_error)?;
            debug!(removed, "deleted imported events");
            Ok(removed)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn list_imported_events(&self, tenant_id: &TenantId) -> Result<Vec<ImportedExternalEvent>> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.clone();

        task::spawn_blocking(move || -> Result<Vec<ImportedExternalEvent>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT tenant_id, external_id, title, description, starts_at, ends_at,
                            all_day, tag, color_id
                     FROM imported_events WHERE tenant_id = ?1
                     ORDER BY starts_at, external_id",
                )
                .map_err(map_sql_error)?;
            let rows =
                stmt.query_map(params![tenant_id.as_str()], Self::map_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}
