pub mod runner;
pub mod scheduler;

pub use runner::JobRunner;
pub use scheduler::{scrape_job, start_scheduler};
