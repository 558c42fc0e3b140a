//! Background job scheduler.
//!
//! Registers the periodic ingestion and the day-rollover duty refresh. Both
//! go through [`IngestionService`], so they share its run guard with the
//! HTTP triggers.

use std::sync::Arc;

use garde_core::AppConfig;
use garde_pipeline::IngestionService;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, a
/// cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    service: Arc<IngestionService>,
    config: &AppConfig,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_ingestion_job(&scheduler, Arc::clone(&service), &config.scrape_cron).await?;
    register_duty_refresh_job(&scheduler, service, &config.duty_refresh_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_ingestion_job(
    scheduler: &JobScheduler,
    service: Arc<IngestionService>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let service = Arc::clone(&service);

        Box::pin(async move {
            tracing::info!("scheduler: starting ingestion run");
            let summary = service.run_ingestion().await;
            tracing::info!(
                success = summary.success,
                count = summary.count,
                "scheduler: ingestion run finished"
            );
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: ingestion job registered");
    Ok(())
}

async fn register_duty_refresh_job(
    scheduler: &JobScheduler,
    service: Arc<IngestionService>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let service = Arc::clone(&service);

        Box::pin(async move {
            let reference_day = service.today();
            if let Err(e) = service.refresh_duty_status(reference_day).await {
                tracing::error!(error = %e, reference_day, "scheduler: duty refresh failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: duty refresh job registered");
    Ok(())
}
