//! Background sync scheduler.
//!
//! Runs a full sync for every active tenant on a cron schedule. Demo tenants
//! carry a fake token and are skipped. Per-tenant failures are logged and
//! never stop the remaining tenants.

use sqlx::PgPool;
use thiserror::Error;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info, warn};

use crate::db::TenantRepository;
use crate::services::IngestionService;

/// Errors building the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// Build and start the cron scheduler, or return `None` when disabled.
///
/// # Errors
///
/// Returns [`SchedulerError`] when the cron expression is invalid or the
/// scheduler cannot start.
pub async fn start(
    enabled: bool,
    cron: &str,
    pool: PgPool,
    ingestion: IngestionService,
) -> Result<Option<JobScheduler>, SchedulerError> {
    if !enabled {
        info!("Background sync scheduler disabled");
        return Ok(None);
    }

    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = pool.clone();
        let ingestion = ingestion.clone();
        Box::pin(async move {
            sync_active_tenants(&pool, &ingestion).await;
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(cron, "Background sync scheduler started");
    Ok(Some(scheduler))
}

/// One scheduler tick: sync every active, non-demo tenant.
async fn sync_active_tenants(pool: &PgPool, ingestion: &IngestionService) {
    let tenants = match TenantRepository::new(pool).list_active().await {
        Ok(tenants) => tenants,
        Err(e) => {
            error!(error = %e, "Scheduled sync could not list tenants");
            return;
        }
    };

    info!(count = tenants.len(), "Scheduled sync tick");
    for tenant in tenants {
        if tenant.is_demo() {
            info!(tenant_id = %tenant.id, "Skipping demo tenant");
            continue;
        }

        let report = ingestion.sync_all(tenant.id).await;
        if report.success {
            info!(tenant_id = %tenant.id, shop = %tenant.shop_domain, "Scheduled sync complete");
        } else {
            warn!(
                tenant_id = %tenant.id,
                shop = %tenant.shop_domain,
                "Scheduled sync finished with failures"
            );
        }
    }
}
