//! Mock repository implementations for testing
//!
//! In-memory versions of the persistence ports with the same upsert and
//! filtering semantics as the SQLite adapters.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use cadence_core::{
    AppointmentRepository, BlockedRangeRepository, CredentialRepository, ImportedEventRepository,
};
use cadence_domain::{
    AppointmentStatus, BlockedTimeRange, CadenceError, ImportedExternalEvent, LocalAppointment,
    OAuthCredential, Result as DomainResult, TenantId, UpsertOutcome,
};
use chrono::{DateTime, Utc};

/// In-memory mock for `CredentialRepository`.
#[derive(Default)]
pub struct MockCredentialRepository {
    credentials: Mutex<HashMap<TenantId, OAuthCredential>>,
    saves: Mutex<usize>,
}

impl MockCredentialRepository {
    pub fn with(credentials: Vec<OAuthCredential>) -> Self {
        let repo = Self::default();
        for credential in credentials {
            repo.credentials.lock().unwrap().insert(credential.tenant_id.clone(), credential);
        }
        repo
    }

    pub fn get(&self, tenant: &str) -> Option<OAuthCredential> {
        self.credentials.lock().unwrap().get(&TenantId::from(tenant)).cloned()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl CredentialRepository for MockCredentialRepository {
    async fn get_credential(&self, tenant_id: &TenantId) -> DomainResult<Option<OAuthCredential>> {
        Ok(self.credentials.lock().unwrap().get(tenant_id).cloned())
    }

    async fn save_credential(&self, credential: &OAuthCredential) -> DomainResult<()> {
        *self.saves.lock().unwrap() += 1;
        self.credentials.lock().unwrap().insert(credential.tenant_id.clone(), credential.clone());
        Ok(())
    }

    async fn delete_credential(&self, tenant_id: &TenantId) -> DomainResult<bool> {
        Ok(self.credentials.lock().unwrap().remove(tenant_id).is_some())
    }

    async fn list_sync_tenants(&self) -> DomainResult<Vec<TenantId>> {
        let mut tenants: Vec<TenantId> = self
            .credentials
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.sync_enabled && !c.needs_reconnect)
            .map(|c| c.tenant_id.clone())
            .collect();
        tenants.sort();
        Ok(tenants)
    }

    async fn mark_synced(&self, tenant_id: &TenantId, at: DateTime<Utc>) -> DomainResult<()> {
        match self.credentials.lock().unwrap().get_mut(tenant_id) {
            Some(credential) => {
                credential.last_synced_at = Some(at);
                Ok(())
            }
            None => Err(CadenceError::NotFound(tenant_id.to_string())),
        }
    }
}

/// In-memory mock for `AppointmentRepository`.
#[derive(Default)]
pub struct MockAppointmentRepository {
    appointments: Mutex<Vec<LocalAppointment>>,
    fail_attach: AtomicBool,
}

impl MockAppointmentRepository {
    pub fn with(appointments: Vec<LocalAppointment>) -> Self {
        Self { appointments: Mutex::new(appointments), fail_attach: AtomicBool::new(false) }
    }

    pub fn fail_attach(&self) {
        self.fail_attach.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, id: &str) -> Option<LocalAppointment> {
        self.appointments.lock().unwrap().iter().find(|a| a.id == id).cloned()
    }
}

#[async_trait]
impl AppointmentRepository for MockAppointmentRepository {
    async fn list_eligible_appointments(
        &self,
        tenant_id: &TenantId,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<LocalAppointment>> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                &a.tenant_id == tenant_id
                    && a.status == AppointmentStatus::Scheduled
                    && a.starts_at >= now
            })
            .cloned()
            .collect())
    }

    async fn list_linked_external_ids(&self, tenant_id: &TenantId) -> DomainResult<HashSet<String>> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| &a.tenant_id == tenant_id)
            .filter_map(|a| a.external_event_id.clone())
            .collect())
    }

    async fn attach_external_id(&self, appointment_id: &str, external_id: &str) -> DomainResult<()> {
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(CadenceError::Persistence("disk full".to_string()));
        }
        let mut appointments = self.appointments.lock().unwrap();
        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| CadenceError::NotFound(appointment_id.to_string()))?;
        appointment.external_event_id = Some(external_id.to_string());
        Ok(())
    }

    async fn detach_external_id(&self, appointment_id: &str) -> DomainResult<()> {
        if let Some(appointment) =
            self.appointments.lock().unwrap().iter_mut().find(|a| a.id == appointment_id)
        {
            appointment.external_event_id = None;
        }
        Ok(())
    }
}

/// In-memory mock for `ImportedEventRepository`.
#[derive(Default)]
pub struct MockImportedEventRepository {
    events: Mutex<HashMap<(TenantId, String), ImportedExternalEvent>>,
}

impl MockImportedEventRepository {
    pub fn with(events: Vec<ImportedExternalEvent>) -> Self {
        let repo = Self::default();
        for event in events {
            repo.events
                .lock()
                .unwrap()
                .insert((event.tenant_id.clone(), event.external_id.clone()), event);
        }
        repo
    }

    pub fn get(&self, tenant: &str, external_id: &str) -> Option<ImportedExternalEvent> {
        self.events
            .lock()
            .unwrap()
            .get(&(TenantId::from(tenant), external_id.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl ImportedEventRepository for MockImportedEventRepository {
    async fn upsert_imported_event(&self, event: &ImportedExternalEvent) -> DomainResult<UpsertOutcome> {
        let previous = self
            .events
            .lock()
            .unwrap()
            .insert((event.tenant_id.clone(), event.external_id.clone()), event.clone());
        Ok(if previous.is_some() { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
    }

    async fn list_imported_external_ids(&self, tenant_id: &TenantId) -> DomainResult<HashSet<String>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .keys()
            .filter(|(tenant, _)| tenant == tenant_id)
            .map(|(_, id)| id.clone())
            .collect())
    }

    async fn delete_imported_events(
        &self,
        tenant_id: &TenantId,
        external_ids: &[String],
    ) -> DomainResult<usize> {
        let mut events = self.events.lock().unwrap();
        Ok(external_ids
            .iter()
            .filter(|id| events.remove(&(tenant_id.clone(), (*id).clone())).is_some())
            .count())
    }

    async fn list_imported_events(
        &self,
        tenant_id: &TenantId,
    ) -> DomainResult<Vec<ImportedExternalEvent>> {
        let mut events: Vec<_> = self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| &e.tenant_id == tenant_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }
}

/// In-memory mock for `BlockedRangeRepository`.
#[derive(Default)]
pub struct MockBlockedRangeRepository {
    ranges: Mutex<HashMap<(TenantId, String), BlockedTimeRange>>,
}

impl MockBlockedRangeRepository {
    pub fn len(&self) -> usize {
        self.ranges.lock().unwrap().len()
    }
}

#[async_trait]
impl BlockedRangeRepository for MockBlockedRangeRepository {
    async fn upsert_blocked_range(&self, range: &BlockedTimeRange) -> DomainResult<UpsertOutcome> {
        let previous = self
            .ranges
            .lock()
            .unwrap()
            .insert((range.tenant_id.clone(), range.external_id.clone()), range.clone());
        Ok(if previous.is_some() { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
    }

    async fn list_blocked_ranges(&self, tenant_id: &TenantId) -> DomainResult<Vec<BlockedTimeRange>> {
        let mut ranges: Vec<_> = self
            .ranges
            .lock()
            .unwrap()
            .values()
            .filter(|r| &r.tenant_id == tenant_id)
            .cloned()
            .collect();
        ranges.sort_by_key(|r| r.starts_at);
        Ok(ranges)
    }
}
