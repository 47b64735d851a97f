pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod scraper;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use mail::{MailMessage, MailTransport};
pub use models::{GenerationParams, InferenceModel};
pub use scraper::{Region, Scraper, SourceMetadata};
pub use storage::JobStore;
pub use types::{
    AnalysisResult, AnalyzedArticle, ArticleRecord, DiscoveredLink, Job, JobId, JobState, JobStatus,
    JobStatusView, JobSummary,
};
