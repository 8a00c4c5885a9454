//! SQLite-backed implementation of the BlockedRangeRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::BlockedRangeRepository;
use cadence_domain::{BlockedTimeRange, Result, TenantId, UpsertOutcome};
use rusqlite::{params, Row};
use tokio::task;
use tracing::instrument;

use super::imported_event_repository::row_exists;
use super::manager::{column_time, map_join_error, map_sql_error, DbManager};

/// SQLite implementation of BlockedRangeRepository
pub struct SqliteBlockedRangeRepository {
    db: Arc<DbManager>,
}

impl SqliteBlockedRangeRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<BlockedTimeRange> {
        Ok(BlockedTimeRange {
            tenant_id: TenantId::new(row.get::<_, String>(0)?),
            external_id: row.get(1)?,
            title: row.get(2)?,
            starts_at: column_time(row, 3)?,
            ends_at: column_time(row, 4)?,
            all_day: row.get(5)?,
        })
    }
}

#[async_trait]
impl BlockedRangeRepository for SqliteBlockedRangeRepository {
    #[instrument(skip(self, range), fields(tenant_id = %range.tenant_id, external_id = %range.external_id))]
    async fn upsert_blocked_range(&self, range: &BlockedTimeRange) -> Result<UpsertOutcome> {
        let db = Arc::clone(&self.db);
        let range = range.clone();

        task::spawn_blocking(move || -> Result<UpsertOutcome> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let existed =
                row_exists(&tx, "blocked_ranges", range.tenant_id.as_str(), &range.external_id)
                    .map_err(map_sql_error)?;

            tx.execute(
                "INSERT INTO blocked_ranges (
                    tenant_id, external_id, title, starts_at, ends_at, all_day, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, CAST(strftime('%s','now') AS INTEGER))
                ON CONFLICT(tenant_id, external_id) DO UPDATE SET
                    title = excluded.title,
                    starts_at = excluded.starts_at,
                    ends_at = excluded.ends_at,
                    all_day = excluded.all_day,
                    updated_at = excluded.updated_at",
                params![
                    range.tenant_id.as_str(),
                    range.external_id,
                    range.title,
                    range.starts_at.timestamp(),
                    range.ends_at.timestamp(),
                    range.all_day,
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
    async fn list_blocked_ranges(&self, tenant_id: &TenantId) -> Result<Vec<BlockedTimeRange>> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.clone();

        task::spawn_blocking(move || -> Result<Vec<BlockedTimeRange>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT tenant_id, external_id, title, starts_at, ends_at, all_day
                     FROM blocked_ranges WHERE tenant_id = ?1
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
