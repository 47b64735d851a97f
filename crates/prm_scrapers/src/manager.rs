use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use prm_core::config::ScraperSettings;
use prm_core::{ArticleRecord, DiscoveredLink, Error, Result, Scraper};
use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::logging::Logger;
use crate::scrapers::ScraperFactory;

/// Articles gathered by one scrape run, tagged with where and how they were
/// obtained.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub country: String,
    pub method: String,
    pub articles: Vec<ArticleRecord>,
}

/// Drives a scraper through both passes: listing pages one after another,
/// then every discovered article in parallel under a semaphore.
pub struct ScraperManager {
    factory: ScraperFactory,
    semaphore: Arc<Semaphore>,
    article_delay: Duration,
    logger: Logger,
}

impl ScraperManager {
    pub fn new(factory: ScraperFactory, max_concurrency: usize, article_delay: Duration) -> Self {
        Self {
            factory,
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            article_delay,
            logger: Logger::new().with_prefix("[China Scraper]"),
        }
    }

    pub fn from_settings(factory: ScraperFactory, settings: &ScraperSettings) -> Self {
        Self::new(factory, settings.max_concurrency, settings.article_delay)
    }

    /// Scrape `num_pages` listing pages and every article linked from them.
    ///
    /// Failed pages and failed articles are logged and skipped. The only
    /// error is a scraper that cannot be created at all.
    pub async fn scrape(&self, num_pages: usize) -> Result<ScrapeOutcome> {
        let scraper: Arc<dyn Scraper> = Arc::from((self.factory)()?);
        let meta = scraper.source_metadata();
        self.logger.info(&format!(
            "{} Starting {} ({}) for {} page(s)",
            meta.region.emoji,
            meta.name,
            scraper.method(),
            num_pages
        ));

        let links = self.discover_all(scraper.as_ref(), num_pages).await;
        self.logger.info(&format!("Total articles to process: {}", links.len()));

        let articles = self.extract_all(scraper.clone(), links).await;
        self.logger.info(&format!("Successfully scraped {} articles", articles.len()));

        Ok(ScrapeOutcome {
            country: meta.region.name.to_string(),
            method: scraper.method().to_string(),
            articles,
        })
    }

    /// Extract a single article page, outside of any listing.
    pub async fn scrape_url(&self, url: &str) -> Result<ArticleRecord> {
        let scraper = (self.factory)()?;
        if !scraper.can_handle(url) {
            return Err(Error::Scraping(format!("No scraper found for URL: {}", url)));
        }
        let link = DiscoveredLink {
            maintitle: String::new(),
            pub_url: url.to_string(),
            publish_date: String::new(),
        };
        scraper.extract(&link).await
    }

    async fn discover_all(&self, scraper: &dyn Scraper, num_pages: usize) -> Vec<DiscoveredLink> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for page in 1..=num_pages {
            self.logger.info(&format!("Scraping page {}/{}", page, num_pages));
            match scraper.discover(page).await {
                Ok(found) => {
                    for link in found {
                        if seen.insert(link.pub_url.clone()) {
                            links.push(link);
                        } else {
                            self.logger.debug(&format!("Skipping duplicate link {}", link.pub_url));
                        }
                    }
                }
                Err(e) => self.logger.error(&format!("Error scraping page {}: {}", page, e)),
            }
        }
        links
    }

    async fn extract_all(&self, scraper: Arc<dyn Scraper>, links: Vec<DiscoveredLink>) -> Vec<ArticleRecord> {
        let tasks = links.into_iter().map(|link| {
            let scraper = scraper.clone();
            let semaphore = self.semaphore.clone();
            let logger = self.logger.clone();
            let delay = self.article_delay;
            async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        logger.error(&format!("Semaphore closed: {}", e));
                        return None;
                    }
                };
                let result = scraper.extract(&link).await;
                sleep(delay).await;
                match result {
                    Ok(article) => Some(article),
                    Err(e) => {
                        logger.error(&format!("Error processing article {}: {}", link.pub_url, e));
                        None
                    }
                }
            }
        });

        join_all(tasks).await.into_iter().flatten().collect()
    }
}

impl std::fmt::Debug for ScraperManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperManager")
            .field("permits", &self.semaphore.available_permits())
            .field("article_delay", &self.article_delay)
            .finish()
    }
}
