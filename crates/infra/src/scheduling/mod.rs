//! Scheduling infrastructure for automated calendar sync
//!
//! The scheduler follows the same runtime rules as the rest of the crate:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on all async operations

pub mod calendar_scheduler;
pub mod error;

pub use calendar_scheduler::{CalendarScheduler, CalendarSchedulerConfig, SyncJob};
pub use error::{SchedulerError, SchedulerResult};
