//! Cron-driven calendar sync scheduler.
//!
//! Runs one sync batch per cron tick with explicit lifecycle management:
//! join handles are tracked, cancellation is explicit, and every lifecycle
//! operation is wrapped in a timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cadence_core::SyncBatchRunner;
//! use cadence_infra::scheduling::{CalendarScheduler, CalendarSchedulerConfig, SchedulerResult};
//!
//! # async fn example(runner: Arc<SyncBatchRunner>) -> SchedulerResult<()> {
//! let mut scheduler = CalendarScheduler::with_config(
//!     CalendarSchedulerConfig {
//!         cron_expression: "0 */15 * * * *".into(), // every 15 minutes
//!         ..Default::default()
//!     },
//!     runner,
//! );
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cadence_core::SyncBatchRunner;
use cadence_domain::{BatchSummary, Result, SyncConfig};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

const JOB_TIMEOUT_GRACE: Duration = Duration::from_secs(60);
const UNBOUNDED_JOB_TIMEOUT: Duration = Duration::from_secs(3600);

/// One unit of scheduled sync work.
#[async_trait]
pub trait SyncJob: Send + Sync {
    async fn run(&self) -> Result<BatchSummary>;
}

#[async_trait]
impl SyncJob for SyncBatchRunner {
    async fn run(&self) -> Result<BatchSummary> {
        self.run_batch().await
    }
}

/// Configuration for the calendar scheduler.
#[derive(Debug, Clone)]
pub struct CalendarSchedulerConfig {
    /// Cron expression describing the execution schedule (with seconds).
    pub cron_expression: String,
    /// Timeout applied to a single batch execution.
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for CalendarSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: cadence_domain::constants::DEFAULT_SYNC_CRON.into(),
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl CalendarSchedulerConfig {
    /// Schedule and job timeout derived from the sync settings; the job may
    /// outlive the batch deadline by a short grace period so in-flight
    /// tenants can finish.
    pub fn from_sync_config(sync: &SyncConfig) -> Self {
        let job_timeout = if sync.batch_deadline_seconds == 0 {
            UNBOUNDED_JOB_TIMEOUT
        } else {
            Duration::from_secs(sync.batch_deadline_seconds) + JOB_TIMEOUT_GRACE
        };
        Self { cron_expression: sync.cron_expression.clone(), job_timeout, ..Self::default() }
    }
}

/// Calendar synchronization scheduler with explicit lifecycle management.
pub struct CalendarScheduler {
    scheduler: Option<JobScheduler>,
    config: CalendarSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    job: Arc<dyn SyncJob>,
    /// Held for the duration of a batch so ticks never overlap.
    in_flight: Arc<Mutex<()>>,
}

impl CalendarScheduler {
    pub fn new(cron_expression: String, job: Arc<dyn SyncJob>) -> Self {
        let config = CalendarSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, job)
    }

    pub fn with_config(config: CalendarSchedulerConfig, job: Arc<dyn SyncJob>) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            job,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self), fields(cron = %self.config.cron_expression))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?
            .map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        self.monitor_handle = Some(tokio::spawn(Self::monitor_task(cancel)));
        info!("calendar scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    ///
    /// A batch already running is not interrupted; remote events it created
    /// without attaching stay orphaned until the next pass.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let mut scheduler = self.scheduler.take().ok_or(SchedulerError::NotRunning)?;

        self.cancellation.cancel();

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, scheduler.shutdown())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?
            .map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("calendar scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed { source })?;
        let job = Arc::clone(&self.job);
        let in_flight = Arc::clone(&self.in_flight);
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let job = Arc::clone(&job);
            let in_flight = Arc::clone(&in_flight);

            Box::pin(async move {
                let Ok(_guard) = in_flight.try_lock() else {
                    warn!("previous calendar sync batch still running; skipping tick");
                    return;
                };
                Self::run_once(job.as_ref(), job_timeout).await;
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "registered calendar sync job");
        Ok(scheduler)
    }

    async fn run_once(job: &dyn SyncJob, job_timeout: Duration) {
        let started = Instant::now();
        match tokio::time::timeout(job_timeout, job.run()).await {
            Ok(Ok(summary)) => {
                info!(
                    tenants = summary.tenants_processed,
                    imported = summary.total_imported,
                    pushed = summary.total_pushed,
                    deleted = summary.total_deleted,
                    skipped = summary.skipped_tenants.len(),
                    tenant_errors = summary.per_tenant_errors.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "calendar sync batch finished"
                );
            }
            Ok(Err(err)) => {
                error!(error = %err, "calendar sync batch failed");
            }
            Err(_) => {
                warn!(timeout_secs = job_timeout.as_secs(), "calendar sync batch timed out");
            }
        }
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("calendar scheduler monitor cancelled");
    }
}

impl Drop for CalendarScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("CalendarScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
