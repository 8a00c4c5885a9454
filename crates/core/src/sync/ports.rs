//! Port interfaces for sync persistence

use std::collections::HashSet;

use async_trait::async_trait;
use cadence_domain::{
    BlockedTimeRange, ImportedExternalEvent, LocalAppointment, OAuthCredential, Result, TenantId,
    UpsertOutcome,
};
use chrono::{DateTime, Utc};

/// Trait for persisting per-tenant OAuth credentials
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Get the credential for a tenant, if one is connected
    async fn get_credential(&self, tenant_id: &TenantId) -> Result<Option<OAuthCredential>>;

    /// Insert or replace a tenant's credential
    async fn save_credential(&self, credential: &OAuthCredential) -> Result<()>;

    /// Remove a tenant's credential. Returns whether a row existed.
    async fn delete_credential(&self, tenant_id: &TenantId) -> Result<bool>;

    /// Tenants with a usable credential and sync enabled
    ///
    /// Credentials flagged `needs_reconnect` are excluded.
    async fn list_sync_tenants(&self) -> Result<Vec<TenantId>>;

    /// Record the completion time of a sync pass
    async fn mark_synced(&self, tenant_id: &TenantId, at: DateTime<Utc>) -> Result<()>;
}

/// Trait for reading appointments and linking them to remote events
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Scheduled appointments of a tenant starting at or after `now`
    async fn list_eligible_appointments(
        &self,
        tenant_id: &TenantId,
        now: DateTime<Utc>,
    ) -> Result<Vec<LocalAppointment>>;

    /// Every remote identifier currently linked to one of the tenant's
    /// appointments, regardless of status or date
    async fn list_linked_external_ids(&self, tenant_id: &TenantId) -> Result<HashSet<String>>;

    /// Store the remote identifier on an appointment
    async fn attach_external_id(&self, appointment_id: &str, external_id: &str) -> Result<()>;

    /// Clear the remote identifier of an appointment
    async fn detach_external_id(&self, appointment_id: &str) -> Result<()>;
}

/// Trait for classified imports of foreign events
#[async_trait]
pub trait ImportedEventRepository: Send + Sync {
    /// Insert or update keyed by `(tenant_id, external_id)`
    async fn upsert_imported_event(&self, event: &ImportedExternalEvent) -> Result<UpsertOutcome>;

    /// External ids of every import currently stored for the tenant
    async fn list_imported_external_ids(&self, tenant_id: &TenantId) -> Result<HashSet<String>>;

    /// Delete the given imports. Returns the number of rows removed.
    async fn delete_imported_events(&self, tenant_id: &TenantId, external_ids: &[String])
        -> Result<usize>;

    /// All imports of a tenant ordered by start time
    async fn list_imported_events(&self, tenant_id: &TenantId)
        -> Result<Vec<ImportedExternalEvent>>;
}

/// Trait for untagged blocking records
#[async_trait]
pub trait BlockedRangeRepository: Send + Sync {
    /// Insert or update keyed by `(tenant_id, external_id)`
    async fn upsert_blocked_range(&self, range: &BlockedTimeRange) -> Result<UpsertOutcome>;

    /// All blocked ranges of a tenant ordered by start time
    async fn list_blocked_ranges(&self, tenant_id: &TenantId) -> Result<Vec<BlockedTimeRange>>;
}
