//! Output strategies for the pull phase
//!
//! The engine decides which remote events are foreign; a projection decides
//! what gets written for them. The scheduled batch uses
//! [`ClassifiedImportProjection`], which also removes imports that vanished
//! remotely. The on-demand trigger defaults to [`BlockedRangeProjection`],
//! which writes untagged blocking records and never deletes.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use cadence_domain::{
    BlockedTimeRange, ForeignEvent, ImportedExternalEvent, Result, TenantId, UpsertOutcome,
};
use tracing::debug;

use crate::classification::EventClassifier;
use crate::sync::ports::{BlockedRangeRepository, ImportedEventRepository};

/// Shape of the local record written for each foreign event
#[async_trait]
pub trait PullProjection: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Insert or update the local record for one foreign event
    async fn write(&self, tenant_id: &TenantId, event: &ForeignEvent) -> Result<UpsertOutcome>;

    /// Delete records whose external id is not in `current_ids`
    ///
    /// Returns the number of records removed. Projections that do not track
    /// their records keep the default no-op.
    async fn remove_stale(&self, _tenant_id: &TenantId, _current_ids: &HashSet<String>)
        -> Result<usize> {
        Ok(0)
    }
}

/// Classified imports with stale cleanup
pub struct ClassifiedImportProjection {
    repository: Arc<dyn ImportedEventRepository>,
    classifier: EventClassifier,
}

impl ClassifiedImportProjection {
    #[must_use]
    pub fn new(repository: Arc<dyn ImportedEventRepository>) -> Self {
        Self { repository, classifier: EventClassifier::default() }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: EventClassifier) -> Self {
        self.classifier = classifier;
        self
    }
}

#[async_trait]
impl PullProjection for ClassifiedImportProjection {
    fn name(&self) -> &'static str {
        "classified"
    }

    async fn write(&self, tenant_id: &TenantId, event: &ForeignEvent) -> Result<UpsertOutcome> {
        let imported = ImportedExternalEvent {
            tenant_id: tenant_id.clone(),
            external_id: event.external_id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            all_day: event.all_day,
            tag: self.classifier.classify(&event.title),
            color_id: event.color_id.clone(),
        };
        self.repository.upsert_imported_event(&imported).await
    }

    async fn remove_stale(&self, tenant_id: &TenantId, current_ids: &HashSet<String>)
        -> Result<usize> {
        let known = self.repository.list_imported_external_ids(tenant_id).await?;
        let mut stale: Vec<String> = known.difference(current_ids).cloned().collect();
        if stale.is_empty() {
            return Ok(0);
        }
        stale.sort();
        debug!(tenant_id = %tenant_id, count = stale.len(), "Removing stale imports");
        self.repository.delete_imported_events(tenant_id, &stale).await
    }
}

/// Untagged blocked ranges, never cleaned up
pub struct BlockedRangeProjection {
    repository: Arc<dyn BlockedRangeRepository>,
}

impl BlockedRangeProjection {
    #[must_use]
    pub fn new(repository: Arc<dyn BlockedRangeRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl PullProjection for BlockedRangeProjection {
    fn name(&self) -> &'static str {
        "blocked_range"
    }

    async fn write(&self, tenant_id: &TenantId, event: &ForeignEvent) -> Result<UpsertOutcome> {
        let range = BlockedTimeRange {
            tenant_id: tenant_id.clone(),
            external_id: event.external_id.clone(),
            title: event.title.clone(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            all_day: event.all_day,
        };
        self.repository.upsert_blocked_range(&range).await
    }
}
