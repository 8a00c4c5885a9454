//! Database implementations

pub mod appointment_repository;
pub mod blocked_range_repository;
pub mod credential_repository;
pub mod imported_event_repository;
pub mod manager;

pub use appointment_repository::SqliteAppointmentRepository;
pub use blocked_range_repository::SqliteBlockedRangeRepository;
pub use credential_repository::SqliteCredentialRepository;
pub use imported_event_repository::SqliteImportedEventRepository;
pub use manager::{DbManager, SqliteConnection};
