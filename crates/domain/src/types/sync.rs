//! Ephemeral outcomes of sync passes and batches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tenant::TenantId;
use crate::errors::CadenceError;

/// One skipped event operation inside an otherwise completed pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFailure {
    /// Appointment id for push failures, remote event id for pull failures.
    pub reference: String,
    pub error: CadenceError,
}

impl EventFailure {
    pub fn new(reference: impl Into<String>, error: CadenceError) -> Self {
        Self { reference: reference.into(), error }
    }
}

/// Outcome of one reconciliation pass for one tenant. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRun {
    pub tenant_id: TenantId,
    pub started_at: DateTime<Utc>,
    pub created: usize,
    pub updated: usize,
    pub imported: usize,
    pub deleted: usize,
    pub echoes_skipped: usize,
    pub failures: Vec<EventFailure>,
    /// Tenant-level error that ended the pass early.
    pub error: Option<CadenceError>,
}

impl SyncRun {
    pub fn new(tenant_id: TenantId, started_at: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            started_at,
            created: 0,
            updated: 0,
            imported: 0,
            deleted: 0,
            echoes_skipped: 0,
            failures: Vec::new(),
            error: None,
        }
    }

    /// Events written to the remote calendar (created plus updated).
    #[must_use]
    pub fn pushed(&self) -> usize {
        self.created + self.updated
    }

    /// A pass with only per-event failures still counts as completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.error.is_none()
    }
}

/// Tenant whose pass failed as a whole
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantFailure {
    pub tenant_id: TenantId,
    pub error: CadenceError,
}

/// Aggregate result of one scheduled batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Tenants whose pass was attempted, successful or not.
    pub tenants_processed: usize,
    pub total_imported: usize,
    pub total_pushed: usize,
    pub total_deleted: usize,
    pub total_event_failures: usize,
    /// Tenants not started before the batch deadline.
    pub skipped_tenants: Vec<TenantId>,
    pub per_tenant_errors: Vec<TenantFailure>,
}

impl BatchSummary {
    /// Fold one tenant's run into the totals.
    pub fn record(&mut self, run: &SyncRun) {
        self.tenants_processed += 1;
        self.total_imported += run.imported;
        self.total_pushed += run.pushed();
        self.total_deleted += run.deleted;
        self.total_event_failures += run.failures.len();
        if let Some(error) = &run.error {
            self.per_tenant_errors
                .push(TenantFailure { tenant_id: run.tenant_id.clone(), error: error.clone() });
        }
    }

    pub fn record_skipped(&mut self, tenant_id: TenantId) {
        self.skipped_tenants.push(tenant_id);
    }
}

/// Response of the on-demand single-tenant trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSyncResult {
    pub pushed: usize,
    pub imported: usize,
    pub message: String,
}

impl ManualSyncResult {
    /// Success message; per-event failures are mentioned but do not fail the
    /// call.
    #[must_use]
    pub fn from_run(run: &SyncRun) -> Self {
        let mut message = format!(
            "Calendar synchronized: {} appointment(s) sent, {} event(s) imported",
            run.pushed(),
            run.imported
        );
        if !run.failures.is_empty() {
            message.push_str(&format!(", {} item(s) skipped", run.failures.len()));
        }
        Self { pushed: run.pushed(), imported: run.imported, message }
    }
}
