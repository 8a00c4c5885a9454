//! SQLite-backed implementation of the CredentialRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::CredentialRepository;
use cadence_domain::{OAuthCredential, Result, TenantId};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{column_time, column_time_opt, map_join_error, map_sql_error, DbManager};

const CREDENTIAL_COLUMNS: &str = "tenant_id, access_token, refresh_token, expires_at, calendar_id,
     sync_enabled, needs_reconnect, last_synced_at";

/// SQLite implementation of CredentialRepository
pub struct SqliteCredentialRepository {
    db: Arc<DbManager>,
}

impl SqliteCredentialRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<OAuthCredential> {
        Ok(OAuthCredential {
            tenant_id: TenantId::new(row.get::<_, String>(0)?),
            access_token: row.get(1)?,
            refresh_token: row.get(2)?,
            expires_at: column_time(row, 3)?,
            calendar_id: row.get(4)?,
            sync_enabled: row.get(5)?,
            needs_reconnect: row.get(6)?,
            last_synced_at: column_time_opt(row, 7)?,
        })
    }
}

#[async_trait]
impl CredentialRepository for SqliteCredentialRepository {
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn get_credential(&self, tenant_id: &TenantId) -> Result<Option<OAuthCredential>> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.clone();

        task::spawn_blocking(move || -> Result<Option<OAuthCredential>> {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!("SELECT {CREDENTIAL_COLUMNS} FROM calendar_credentials WHERE tenant_id = ?1"),
                params![tenant_id.as_str()],
                Self::map_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, credential), fields(tenant_id = %credential.tenant_id))]
    async fn save_credential(&self, credential: &OAuthCredential) -> Result<()> {
        let db = Arc::clone(&self.db);
        let credential = credential.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO calendar_credentials (
                    tenant_id, access_token, refresh_token, expires_at, calendar_id,
                    sync_enabled, needs_reconnect, last_synced_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, CAST(strftime('%s','now') AS INTEGER))
                ON CONFLICT(tenant_id) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    expires_at = excluded.expires_at,
                    calendar_id = excluded.calendar_id,
                    sync_enabled = excluded.sync_enabled,
                    needs_reconnect = excluded.needs_reconnect,
                    last_synced_at = excluded.last_synced_at,
                    updated_at = excluded.updated_at",
                params![
                    credential.tenant_id.as_str(),
                    credential.access_token,
                    credential.refresh_token,
                    credential.expires_at.timestamp(),
                    credential.calendar_id,
                    credential.sync_enabled,
                    credential.needs_reconnect,
                    credential.last_synced_at.map(|at| at.timestamp()),
                ],
            )
            .map_err(map_sql_error)?;
            debug!("credential saved");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn delete_credential(&self, tenant_id: &TenantId) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.clone();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let removed = conn
                .execute(
                    "DELETE FROM calendar_credentials WHERE tenant_id = ?1",
                    params![tenant_id.as_str()],
                )
                .map_err(map_sql_error)?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn list_sync_tenants(&self) -> Result<Vec<TenantId>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<TenantId>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT tenant_id FROM calendar_credentials
                     WHERE sync_enabled = 1 AND needs_reconnect = 0
                     ORDER BY tenant_id",
                )
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0).map(TenantId::new))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn mark_synced(&self, tenant_id: &TenantId, at: DateTime<Utc>) -> Result<()> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE calendar_credentials SET last_synced_at = ?2 WHERE tenant_id = ?1",
                params![tenant_id.as_str(), at.timestamp()],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}
