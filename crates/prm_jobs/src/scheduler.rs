//! Recurring scrapes driven by `tokio-cron-scheduler`.
//!
//! Scheduled runs go through [`JobRunner::trigger`] like HTTP-triggered
//! ones, so they show up in the job store as well.

use std::sync::Arc;

use prm_core::config::JobSettings;
use prm_core::{Error, Result};
use prm_scrapers::Logger;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::runner::JobRunner;

fn scheduler_error(context: &str, e: JobSchedulerError) -> Error {
    Error::External(anyhow::anyhow!("{}: {:?}", context, e))
}

/// Cron job that triggers a scrape of `num_pages` pages. `schedule` uses
/// the six-field format with seconds, evaluated in UTC.
pub fn scrape_job(runner: Arc<JobRunner>, schedule: &str, num_pages: usize) -> Result<Job> {
    Job::new_async(schedule, move |_uuid, _lock| {
        let runner = runner.clone();
        Box::pin(async move {
            let logger = Logger::new().with_prefix("[Scheduler]");
            logger.info("Running scheduled scrape");
            match runner.trigger(num_pages).await {
                Ok(job_id) => logger.info(&format!("Scheduled scrape started as job {}", job_id)),
                Err(e) => logger.error(&format!("Scheduled scrape could not start: {}", e)),
            }
        })
    })
    .map_err(|e| Error::Config(format!("Invalid schedule '{}': {:?}", schedule, e)))
}

/// Start the scheduler with the daily scrape. The returned handle must be
/// kept alive for as long as jobs should fire.
pub async fn start_scheduler(runner: Arc<JobRunner>, settings: &JobSettings) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| scheduler_error("Failed to create scheduler", e))?;

    let job = scrape_job(runner, &settings.schedule, settings.scheduled_pages)?;
    scheduler
        .add(job)
        .await
        .map_err(|e| scheduler_error("Failed to add scheduled scrape", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| scheduler_error("Failed to start scheduler", e))?;

    tracing::info!(
        "[Scheduler] Scheduled scrape of {} page(s) at '{}' (UTC)",
        settings.scheduled_pages,
        settings.schedule
    );
    Ok(scheduler)
}
