pub mod fetch;
pub mod logging;
pub mod manager;
pub mod scrapers;

pub use logging::{init_logging, Logger};
pub use manager::{ScrapeOutcome, ScraperManager};
pub use scrapers::{create_scraper_factory, BoxedScraper, ScraperFactory};

pub mod prelude {
    pub use super::manager::ScraperManager;
    pub use prm_core::{ArticleRecord, Error, Result, Scraper};
}
