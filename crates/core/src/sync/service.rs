//! Full sync pass for a single tenant
//!
//! Sequence: token, push, fetch, pull, mark synced. Used as-is by both the
//! scheduled batch and the on-demand trigger; they differ only in the
//! projection handed in.

use std::collections::HashSet;
use std::sync::Arc;

use cadence_domain::{CadenceError, EventFailure, Result, SyncRun, TenantId, TimeWindow};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::auth::TokenManager;
use crate::calendar_ports::RemoteCalendar;
use crate::sync::engine::ReconciliationEngine;
use crate::sync::ports::{AppointmentRepository, CredentialRepository};
use crate::sync::projection::PullProjection;
use crate::utils::clock::Clock;

/// Runs reconciliation passes, at most one at a time per tenant
pub struct CalendarSyncService {
    tokens: Arc<TokenManager>,
    remote: Arc<dyn RemoteCalendar>,
    appointments: Arc<dyn AppointmentRepository>,
    credentials: Arc<dyn CredentialRepository>,
    engine: ReconciliationEngine,
    clock: Arc<dyn Clock>,
    window_days: u32,
    tenant_locks: DashMap<TenantId, Arc<Mutex<()>>>,
}

impl CalendarSyncService {
    #[must_use]
    pub fn new(
        tokens: Arc<TokenManager>,
        remote: Arc<dyn RemoteCalendar>,
        appointments: Arc<dyn AppointmentRepository>,
        credentials: Arc<dyn CredentialRepository>,
        engine: ReconciliationEngine,
        clock: Arc<dyn Clock>,
        window_days: u32,
    ) -> Self {
        Self {
            tokens,
            remote,
            appointments,
            credentials,
            engine,
            clock,
            window_days,
            tenant_locks: DashMap::new(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Run one full pass for `tenant_id`.
    ///
    /// Never fails as a whole: a tenant-level problem ends the pass early and
    /// is stored in [`SyncRun::error`], alongside whatever was already done.
    /// A second pass for a tenant that is already syncing returns at once
    /// with `SyncInProgress`.
    #[instrument(skip(self, projection), fields(tenant_id = %tenant_id, projection = projection.name()))]
    pub async fn sync_tenant(&self, tenant_id: &TenantId, projection: &dyn PullProjection) -> SyncRun {
        let mut run = SyncRun::new(tenant_id.clone(), self.clock.now());

        let lock = self.tenant_locks.entry(tenant_id.clone()).or_default().clone();
        let Ok(guard) = lock.try_lock() else {
            warn!("Sync already running for tenant; skipping");
            run.error = Some(CadenceError::SyncInProgress(tenant_id.to_string()));
            return run;
        };

        match self.run_pass(tenant_id, projection, &mut run).await {
            Ok(()) => info!(
                created = run.created,
                updated = run.updated,
                imported = run.imported,
                deleted = run.deleted,
                echoes = run.echoes_skipped,
                failures = run.failures.len(),
                "Tenant sync completed"
            ),
            Err(err) => {
                warn!(error = %err, kind = err.label(), "Tenant sync aborted");
                run.error = Some(err);
            }
        }

        drop(guard);
        drop(lock);
        // Only the map holds the lock now unless another pass is waiting on it.
        self.tenant_locks.remove_if(tenant_id, |_, lock| Arc::strong_count(lock) == 1);

        run
    }

    /// Number of tenants that currently hold a pass lock entry.
    #[must_use]
    pub fn tracked_tenants(&self) -> usize {
        self.tenant_locks.len()
    }

    async fn run_pass(
        &self,
        tenant_id: &TenantId,
        projection: &dyn PullProjection,
        run: &mut SyncRun,
    ) -> Result<()> {
        let grant = self.tokens.get_valid_access_token(tenant_id).await?;
        let now = self.clock.now();
        let mut minted_ids = Vec::new();

        match self.appointments.list_eligible_appointments(tenant_id, now).await {
            Ok(candidates) => {
                let push = self
                    .engine
                    .push(self.remote.as_ref(), &grant, self.appointments.as_ref(), &candidates, now)
                    .await;
                run.created = push.created;
                run.updated = push.updated;
                run.failures.extend(push.failures);
                minted_ids = push.minted_ids;
            }
            Err(err) => {
                warn!(error = %err, "Could not load appointments; skipping push phase");
                run.failures.push(EventFailure::new("appointments", err));
            }
        }

        let window = TimeWindow::starting_at(now, self.window_days);
        let mut events = self.remote.list_events(&grant, &window).await?;
        // Providers match the window on event end, so in-progress events come back too.
        let fetched = events.len();
        events.retain(|event| self.engine.starts_within(event, &window));
        if events.len() < fetched {
            debug!(dropped = fetched - events.len(), "Ignoring remote events that started before the window");
        }

        // Echo set must be complete, otherwise our own events would be imported.
        let mut ours: HashSet<String> = self.appointments.list_linked_external_ids(tenant_id).await?;
        ours.extend(minted_ids);

        let pull = self.engine.pull(tenant_id, events, &ours, projection).await;
        run.imported = pull.imported();
        run.deleted = pull.deleted;
        run.echoes_skipped = pull.echoes_skipped;
        run.failures.extend(pull.failures);

        if let Err(err) = self.credentials.mark_synced(tenant_id, self.clock.now()).await {
            warn!(error = %err, "Failed to record sync time");
            run.failures.push(EventFailure::new("last-synced-at", err));
        }

        Ok(())
    }
}
