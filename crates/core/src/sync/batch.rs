//! Scheduled batch over every sync-enabled tenant
//!
//! Tenants are independent units of work. They run with bounded concurrency;
//! a failing tenant is logged and recorded without stopping the others. When
//! the optional deadline passes, tenants not yet started are skipped and left
//! for the next run.

use std::sync::Arc;
use std::time::Duration;

use cadence_domain::{BatchSummary, Result, SyncConfig, SyncRun, TenantId};
use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::sync::ports::CredentialRepository;
use crate::sync::projection::PullProjection;
use crate::sync::service::CalendarSyncService;

/// Concurrency and deadline for one batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub max_concurrent_tenants: usize,
    pub deadline: Option<Duration>,
}

impl BatchOptions {
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_concurrent_tenants: config.max_concurrent_tenants.max(1),
            deadline: (config.batch_deadline_seconds > 0)
                .then(|| Duration::from_secs(config.batch_deadline_seconds)),
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

enum TenantOutcome {
    Ran(SyncRun),
    Skipped(TenantId),
}

/// Batch runner used by the scheduler and the `sync-all` command
pub struct SyncBatchRunner {
    service: Arc<CalendarSyncService>,
    credentials: Arc<dyn CredentialRepository>,
    projection: Arc<dyn PullProjection>,
    options: BatchOptions,
}

impl SyncBatchRunner {
    #[must_use]
    pub fn new(
        service: Arc<CalendarSyncService>,
        credentials: Arc<dyn CredentialRepository>,
        projection: Arc<dyn PullProjection>,
        options: BatchOptions,
    ) -> Self {
        Self { service, credentials, projection, options }
    }

    /// Sync every tenant with an enabled, usable credential.
    ///
    /// # Errors
    /// Only when the tenant list itself cannot be loaded. Failures inside a
    /// tenant's pass are reported in [`BatchSummary::per_tenant_errors`].
    #[instrument(skip(self))]
    pub async fn run_batch(&self) -> Result<BatchSummary> {
        let tenants = self.credentials.list_sync_tenants().await?;
        let deadline = self.options.deadline.map(|limit| Instant::now() + limit);
        let concurrency = self.options.max_concurrent_tenants.max(1);
        info!(tenants = tenants.len(), concurrency, "Starting calendar sync batch");

        let service = self.service.as_ref();
        let projection = self.projection.as_ref();

        let outcomes: Vec<TenantOutcome> = stream::iter(tenants)
            .map(|tenant_id| async move {
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    return TenantOutcome::Skipped(tenant_id);
                }
                TenantOutcome::Ran(service.sync_tenant(&tenant_id, projection).await)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut summary = BatchSummary::default();
        for outcome in outcomes {
            match outcome {
                TenantOutcome::Ran(run) => {
                    if let Some(err) = &run.error {
                        error!(tenant_id = %run.tenant_id, error = %err, "Tenant sync failed");
                    }
                    summary.record(&run);
                }
                TenantOutcome::Skipped(tenant_id) => summary.record_skipped(tenant_id),
            }
        }

        if !summary.skipped_tenants.is_empty() {
            warn!(skipped = summary.skipped_tenants.len(), "Batch deadline reached; remaining tenants deferred");
        }
        info!(
            tenants_processed = summary.tenants_processed,
            total_pushed = summary.total_pushed,
            total_imported = summary.total_imported,
            total_deleted = summary.total_deleted,
            tenant_errors = summary.per_tenant_errors.len(),
            "Calendar sync batch finished"
        );

        Ok(summary)
    }
}
