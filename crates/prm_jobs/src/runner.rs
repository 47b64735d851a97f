use std::any::Any;
use std::sync::Arc;

use prm_core::{AnalyzedArticle, JobId, JobStore, JobSummary, Result};
use prm_inference::ArticleAnalyzer;
use prm_mailer::DigestNotifier;
use prm_scrapers::{Logger, ScraperManager};

/// Runs scrape → analyze → notify pipelines and records their outcome in
/// the job store.
pub struct JobRunner {
    store: Arc<dyn JobStore>,
    scraper: ScraperManager,
    analyzer: ArticleAnalyzer,
    notifier: Option<DigestNotifier>,
}

impl JobRunner {
    /// Without a notifier, runs complete without sending a digest.
    pub fn new(
        store: Arc<dyn JobStore>,
        scraper: ScraperManager,
        analyzer: ArticleAnalyzer,
        notifier: Option<DigestNotifier>,
    ) -> Self {
        Self {
            store,
            scraper,
            analyzer,
            notifier,
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Register a pending job and start it in the background.
    pub async fn trigger(self: &Arc<Self>, num_pages: usize) -> Result<JobId> {
        let job_id = self.store.create().await?;
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            let worker = Arc::clone(&runner);
            let handle = tokio::spawn(async move { worker.run(&job_id, num_pages).await });
            let recorded = match handle.await {
                Ok(recorded) => recorded,
                Err(e) => {
                    let message = if e.is_panic() {
                        format!("Job panicked: {}", panic_message(e.into_panic()))
                    } else {
                        format!("Job cancelled: {}", e)
                    };
                    tracing::error!("[Job {}] {}", job_id, message);
                    runner.store.mark_failed(&job_id, &message).await
                }
            };
            if let Err(e) = recorded {
                tracing::error!("[Job {}] Could not record job outcome: {}", job_id, e);
            }
        });
        Ok(job_id)
    }

    /// Execute the pipeline for an already registered job and store the
    /// outcome. The returned error only concerns the store itself; pipeline
    /// failures end up as a failed job.
    pub async fn run(&self, job_id: &JobId, num_pages: usize) -> Result<()> {
        let logger = Logger::new().with_prefix(format!("[Job {}]", job_id));
        logger.info(&format!("Started, scraping {} page(s)", num_pages));

        let outcome = self
            .execute(num_pages, &logger)
            .await
            .and_then(|summary| Ok((summary.count, serde_json::to_value(&summary)?)));
        match outcome {
            Ok((count, result)) => {
                logger.info(&format!("Completed with {} relevant article(s)", count));
                self.store.mark_completed(job_id, result).await
            }
            Err(e) => {
                logger.error(&format!("Failed: {}", e));
                self.store.mark_failed(job_id, &e.to_string()).await
            }
        }
    }

    async fn execute(&self, num_pages: usize, logger: &Logger) -> Result<JobSummary> {
        let outcome = self.scraper.scrape(num_pages).await?;
        logger.info(&format!("Scraped {} article(s), analyzing", outcome.articles.len()));

        let mut kept = Vec::new();
        for article in outcome.articles {
            match self.analyzer.analyze(&article).await {
                Ok(analysis) => {
                    if let Some(analysis) = analysis.into_kept() {
                        kept.push(AnalyzedArticle { article, analysis });
                    }
                }
                Err(e) => logger.warn(&format!("Skipping '{}': {}", article.maintitle, e)),
            }
        }

        if !kept.is_empty() {
            match &self.notifier {
                Some(notifier) => notifier.notify(&kept).await?,
                None => logger.info("Email disabled, digest not sent"),
            }
        }

        Ok(JobSummary::new(&outcome.country, &outcome.method, kept))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
