//! # Cadence Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for credentials, appointments, imports
//!   and the remote calendar
//! - Token lifecycle management
//! - Event classification
//! - The reconciliation engine and its batch / single-tenant runners
//!
//! ## Architecture Principles
//! - Only depends on `cadence-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod auth;
pub mod calendar_ports;
pub mod classification;
pub mod sync;
pub mod utils;

pub use auth::TokenManager;
pub use calendar_ports::{OAuthTokenClient, RemoteCalendar};
pub use classification::{classify_title, EventClassifier};
pub use sync::{
    AppointmentRepository, BatchOptions, BlockedRangeProjection, BlockedRangeRepository,
    CalendarSyncService, ClassifiedImportProjection, CredentialRepository,
    ImportedEventRepository, PullProjection, ReconciliationEngine, SyncBatchRunner,
};
pub use utils::clock::{Clock, MockClock, SystemClock};
