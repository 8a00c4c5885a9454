//! Calendar reconciliation: ports, engine, projections and runners

pub mod batch;
pub mod engine;
pub mod ports;
pub mod projection;
pub mod service;

pub use batch::{BatchOptions, SyncBatchRunner};
pub use engine::{PullOutcome, PullPartition, PushOutcome, ReconciliationEngine};
pub use ports::{
    AppointmentRepository, BlockedRangeRepository, CredentialRepository, ImportedEventRepository,
};
pub use projection::{BlockedRangeProjection, ClassifiedImportProjection, PullProjection};
pub use service::CalendarSyncService;
