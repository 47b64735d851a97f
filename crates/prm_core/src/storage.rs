use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Job, JobId};
use crate::Result;

/// Registry of scrape jobs shared by the runner and the HTTP layer.
///
/// Each job is written by exactly one task, while any number of readers may
/// poll its status concurrently.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Allocate a fresh id and insert a pending job under it
    async fn create(&self) -> Result<JobId>;

    /// Fetch a snapshot of a job, or `Error::JobNotFound`
    async fn get(&self, id: &JobId) -> Result<Job>;

    /// Move a pending job to completed
    async fn mark_completed(&self, id: &JobId, result: Value) -> Result<()>;

    /// Move a pending job to failed
    async fn mark_failed(&self, id: &JobId, error_message: &str) -> Result<()>;

    /// Number of jobs currently tracked
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
