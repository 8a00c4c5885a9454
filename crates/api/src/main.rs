//! Cadence - calendar synchronization service
//!
//! Main entry point for the `cadence` binary.

use std::path::PathBuf;

use anyhow::Context;
use cadence_api::utils::logging::init_tracing;
use cadence_api::{run_scheduled_sync, sync_calendar_now, AppContext};
use cadence_domain::{CadenceError, TenantId};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cadence", version, about = "Two-way appointment calendar synchronization")]
struct Cli {
    /// Explicit config file; otherwise environment variables, then probed files.
    #[arg(long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cron scheduler until interrupted
    Serve,
    /// Run one sync batch across all eligible tenants and exit
    SyncAll,
    /// Synchronize a single tenant now
    SyncTenant {
        tenant_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => cadence_infra::config::load_from_file(Some(path.clone())),
        None => cadence_infra::config::load(),
    }
    .context("failed to load configuration")?;
    init_tracing(&config.logging)?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => info!(reason = %err, "no .env loaded"),
    }

    let ctx = AppContext::new_with_config(config).context("failed to initialize application")?;

    match cli.command {
        Commands::Serve => {
            let mut scheduler = ctx.start_scheduler().await?;
            info!(cron = %ctx.config.sync.cron_expression, "cadence scheduler running");
            tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
            info!("shutdown requested");
            scheduler.stop().await.map_err(CadenceError::from)?;
        }
        Commands::SyncAll => {
            let summary = run_scheduled_sync(&ctx).await?;
            if !summary.per_tenant_errors.is_empty() {
                warn!(failed = summary.per_tenant_errors.len(), "some tenants failed");
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::SyncTenant { tenant_id } => {
            let result = sync_calendar_now(&ctx, &TenantId::new(tenant_id)).await?;
            println!("{}", result.message);
        }
    }

    Ok(())
}
