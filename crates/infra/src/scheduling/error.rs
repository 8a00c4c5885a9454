//! Scheduler error types

use std::time::Duration;

use cadence_domain::CadenceError;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tokio_cron_scheduler::JobSchedulerError;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    #[error("Failed to create scheduler: {source}")]
    CreationFailed { source: JobSchedulerError },

    #[error("Failed to start scheduler: {source}")]
    StartFailed { source: JobSchedulerError },

    #[error("Failed to stop scheduler: {source}")]
    StopFailed { source: JobSchedulerError },

    /// Usually an invalid cron expression
    #[error("Failed to register job: {source}")]
    JobRegistrationFailed { source: JobSchedulerError },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration, source: Elapsed },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(#[from] JoinError),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let mapped = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                CadenceError::InvalidInput(err.to_string())
            }
            SchedulerError::JobRegistrationFailed { .. } => CadenceError::Config(err.to_string()),
            _ => CadenceError::Internal(err.to_string()),
        };
        InfraError(mapped)
    }
}

impl From<SchedulerError> for CadenceError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_misuse_maps_to_invalid_input() {
        let mapped: CadenceError = SchedulerError::AlreadyRunning.into();
        assert!(matches!(mapped, CadenceError::InvalidInput(_)));
    }
}
