//! Application context - dependency injection container

use std::sync::Arc;

use cadence_core::{
    AppointmentRepository, BatchOptions, BlockedRangeProjection, CalendarSyncService,
    ClassifiedImportProjection, Clock, CredentialRepository, PullProjection, ReconciliationEngine,
    SyncBatchRunner, SystemClock, TokenManager,
};
use cadence_domain::{CadenceError, Config, ManualProjection, Result};
use cadence_infra::scheduling::{CalendarScheduler, CalendarSchedulerConfig, SyncJob};
use cadence_infra::{
    DbManager, GoogleCalendarClient, GoogleOAuthClient, SqliteAppointmentRepository,
    SqliteBlockedRangeRepository, SqliteCredentialRepository, SqliteImportedEventRepository,
};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub credentials: Arc<dyn CredentialRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub tokens: Arc<TokenManager>,
    pub clock: Arc<dyn Clock>,
    pub sync_service: Arc<CalendarSyncService>,
    pub batch_runner: Arc<SyncBatchRunner>,
    /// Projection used by the on-demand single-tenant trigger.
    pub manual_projection: Arc<dyn PullProjection>,
}

impl AppContext {
    /// Load configuration from the environment (or a probed config file)
    /// and build the context.
    pub fn new() -> Result<Self> {
        let config = cadence_infra::config::load()?;
        Self::new_with_config(config)
    }

    /// Build the context from an explicit configuration.
    pub fn new_with_config(config: Config) -> Result<Self> {
        Self::new_with_clock(config, Arc::new(SystemClock))
    }

    pub fn new_with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let credentials: Arc<dyn CredentialRepository> =
            Arc::new(SqliteCredentialRepository::new(Arc::clone(&db)));
        let appointments: Arc<dyn AppointmentRepository> =
            Arc::new(SqliteAppointmentRepository::new(Arc::clone(&db)));
        let imported_events = Arc::new(SqliteImportedEventRepository::new(Arc::clone(&db)));
        let blocked_ranges = Arc::new(SqliteBlockedRangeRepository::new(Arc::clone(&db)));

        let tokens = Arc::new(TokenManager::new(
            Arc::clone(&credentials),
            Arc::new(GoogleOAuthClient::new(&config.oauth)?),
            Arc::clone(&clock),
            config.oauth.refresh_threshold_seconds,
        ));

        let sync_service = Arc::new(CalendarSyncService::new(
            Arc::clone(&tokens),
            Arc::new(GoogleCalendarClient::new(&config.calendar)?),
            Arc::clone(&appointments),
            Arc::clone(&credentials),
            ReconciliationEngine::from_config(&config)?,
            Arc::clone(&clock),
            config.sync.window_days,
        ));

        let classified: Arc<dyn PullProjection> =
            Arc::new(ClassifiedImportProjection::new(imported_events));
        let manual_projection: Arc<dyn PullProjection> = match config.sync.manual_projection {
            ManualProjection::BlockedRange => Arc::new(BlockedRangeProjection::new(blocked_ranges)),
            ManualProjection::Classified => Arc::clone(&classified),
        };

        let batch_runner = Arc::new(SyncBatchRunner::new(
            Arc::clone(&sync_service),
            Arc::clone(&credentials),
            classified,
            BatchOptions::from_config(&config.sync),
        ));

        info!(
            db_path = %config.database.path,
            time_zone = %config.calendar.time_zone,
            manual_projection = manual_projection.name(),
            "application context initialized"
        );

        Ok(Self {
            config,
            db,
            credentials,
            appointments,
            tokens,
            clock,
            sync_service,
            batch_runner,
            manual_projection,
        })
    }

    /// Build and start the cron scheduler for the sync batch.
    pub async fn start_scheduler(&self) -> Result<CalendarScheduler> {
        if !self.config.sync.enabled {
            return Err(CadenceError::Config("scheduled sync is disabled".into()));
        }

        let job: Arc<dyn SyncJob> = Arc::clone(&self.batch_runner) as Arc<dyn SyncJob>;
        let mut scheduler = CalendarScheduler::with_config(
            CalendarSchedulerConfig::from_sync_config(&self.config.sync),
            job,
        );
        scheduler.start().await?;
        Ok(scheduler)
    }
}
