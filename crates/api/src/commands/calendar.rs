//! Calendar sync commands

use std::time::Instant;

use cadence_domain::constants::DEFAULT_CALENDAR_ID;
use cadence_domain::{
    BatchSummary, CadenceError, CalendarStatus, ManualSyncResult, OAuthCredential, Result,
    TenantId,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::utils::logging::log_command_execution;
use crate::AppContext;

/// Tokens from a completed consent flow
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectCalendarRequest {
    pub tenant_id: TenantId,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub calendar_id: Option<String>,
}

impl std::fmt::Debug for ConnectCalendarRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectCalendarRequest")
            .field("tenant_id", &self.tenant_id)
            .field("expires_in", &self.expires_in)
            .field("calendar_id", &self.calendar_id)
            .finish_non_exhaustive()
    }
}

/// Run one sync batch across every eligible tenant.
#[instrument(skip(ctx))]
pub async fn run_scheduled_sync(ctx: &AppContext) -> Result<BatchSummary> {
    let command_name = "calendar::run_scheduled_sync";
    let start = Instant::now();

    let result = ctx.batch_runner.run_batch().await;

    log_command_execution(command_name, start.elapsed(), result.is_ok());
    result
}

/// Synchronize one tenant now, skipping the multi-tenant loop.
///
/// Per-event failures are reported in the message; a tenant-level failure
/// (not connected, reconnect required, fetch failed, already syncing) is
/// returned as the error.
#[instrument(skip(ctx), fields(tenant_id = %tenant_id))]
pub async fn sync_calendar_now(ctx: &AppContext, tenant_id: &TenantId) -> Result<ManualSyncResult> {
    let command_name = "calendar::sync_calendar_now";
    let start = Instant::now();

    let run = ctx.sync_service.sync_tenant(tenant_id, ctx.manual_projection.as_ref()).await;
    let result = match run.error {
        Some(ref err) => {
            warn!(error = %err, kind = err.label(), "on-demand sync failed");
            Err(err.clone())
        }
        None => Ok(ManualSyncResult::from_run(&run)),
    };

    log_command_execution(command_name, start.elapsed(), result.is_ok());
    result
}

/// Store (or replace) a tenant's calendar credential.
#[instrument(skip(ctx, request), fields(tenant_id = %request.tenant_id))]
pub async fn connect_calendar(
    ctx: &AppContext,
    request: ConnectCalendarRequest,
) -> Result<CalendarStatus> {
    let command_name = "calendar::connect_calendar";
    let start = Instant::now();

    let result = async move {
        if request.access_token.trim().is_empty() || request.refresh_token.trim().is_empty() {
            return Err(CadenceError::InvalidInput("access and refresh tokens are required".into()));
        }
        if request.expires_in <= 0 {
            return Err(CadenceError::InvalidInput("expires_in must be positive".into()));
        }

        let expires_at = OAuthCredential::expiry_after(ctx.clock.now(), request.expires_in)
            .ok_or_else(|| CadenceError::InvalidInput("expires_in is out of range".into()))?;

        let mut credential = OAuthCredential::new(
            request.tenant_id.clone(),
            request.access_token,
            request.refresh_token,
            expires_at,
        );
        credential.calendar_id = request
            .calendar_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string());

        ctx.tokens.store_credential(credential).await?;
        status_for(ctx, &request.tenant_id).await
    }
    .await;

    log_command_execution(command_name, start.elapsed(), result.is_ok());
    result
}

/// Remove a tenant's credential. Remote events already pushed stay where
/// they are.
#[instrument(skip(ctx), fields(tenant_id = %tenant_id))]
pub async fn disconnect_calendar(ctx: &AppContext, tenant_id: &TenantId) -> Result<bool> {
    let command_name = "calendar::disconnect_calendar";
    let start = Instant::now();

    let result = ctx.tokens.clear_credential(tenant_id).await;

    log_command_execution(command_name, start.elapsed(), result.is_ok());
    result
}

/// Include or exclude a connected tenant from scheduled batches.
#[instrument(skip(ctx), fields(tenant_id = %tenant_id))]
pub async fn set_sync_enabled(
    ctx: &AppContext,
    tenant_id: &TenantId,
    enabled: bool,
) -> Result<CalendarStatus> {
    let command_name = "calendar::set_sync_enabled";
    let start = Instant::now();

    let result = async move {
        let mut credential = ctx
            .credentials
            .get_credential(tenant_id)
            .await?
            .ok_or_else(|| CadenceError::NotConnected(tenant_id.to_string()))?;
        credential.sync_enabled = enabled;
        ctx.credentials.save_credential(&credential).await?;
        info!(enabled, "sync toggled");
        Ok(status_from(tenant_id, Some(&credential)))
    }
    .await;

    log_command_execution(command_name, start.elapsed(), result.is_ok());
    result
}

/// Connection status of a tenant; never fails for unknown tenants.
#[instrument(skip(ctx), fields(tenant_id = %tenant_id))]
pub async fn calendar_status(ctx: &AppContext, tenant_id: &TenantId) -> Result<CalendarStatus> {
    status_for(ctx, tenant_id).await
}

async fn status_for(ctx: &AppContext, tenant_id: &TenantId) -> Result<CalendarStatus> {
    let credential = ctx.credentials.get_credential(tenant_id).await?;
    Ok(status_from(tenant_id, credential.as_ref()))
}

fn status_from(tenant_id: &TenantId, credential: Option<&OAuthCredential>) -> CalendarStatus {
    match credential {
        Some(credential) => CalendarStatus {
            tenant_id: tenant_id.clone(),
            connected: true,
            sync_enabled: credential.sync_enabled,
            needs_reconnect: credential.needs_reconnect,
            calendar_id: Some(credential.calendar_id.clone()),
            last_synced_at: credential.last_synced_at,
        },
        None => CalendarStatus {
            tenant_id: tenant_id.clone(),
            connected: false,
            sync_enabled: false,
            needs_reconnect: false,
            calendar_id: None,
            last_synced_at: None,
        },
    }
}
