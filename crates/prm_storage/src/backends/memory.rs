use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prm_core::config::JobSettings;
use prm_core::{Error, Job, JobId, JobState, JobStore, Result};
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Upper bound on tracked jobs; only finished jobs are evicted to honour it
    pub max_entries: Option<usize>,
    /// How long a finished job stays visible
    pub ttl: Option<Duration>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self {
            max_entries: None,
            ttl: None,
        }
    }

    pub fn from_settings(settings: &JobSettings) -> Self {
        Self {
            max_entries: Some(settings.max_entries),
            ttl: Some(settings.ttl),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MemoryStore {
    jobs: HashMap<JobId, Job>,
    order: VecDeque<JobId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn insert(&mut self, job: Job) -> JobId {
        let id = job.id;
        self.order.push_back(id);
        self.jobs.insert(id, job);
        id
    }

    fn get(&self, id: &JobId) -> Result<Job> {
        self.jobs.get(id).cloned().ok_or(Error::JobNotFound(*id))
    }

    fn finish(&mut self, id: &JobId, state: JobState) -> Result<()> {
        let job = self.jobs.get_mut(id).ok_or(Error::JobNotFound(*id))?;
        if job.state.is_finished() {
            return Err(Error::InvalidTransition {
                id: *id,
                status: job.status().to_string(),
            });
        }
        job.state = state;
        job.updated_at = Utc::now();
        Ok(())
    }

    fn remove(&mut self, id: &JobId) {
        self.jobs.remove(id);
        self.order.retain(|other| other != id);
    }

    /// Drop expired finished jobs, then the oldest finished ones until the
    /// store fits in `max_entries`. Pending jobs are never touched.
    fn evict(&mut self, config: &MemoryConfig, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;

        if let Some(ttl) = config.ttl.and_then(|t| chrono::Duration::from_std(t).ok()) {
            let expired: Vec<JobId> = self
                .order
                .iter()
                .filter(|id| {
                    self.jobs
                        .get(id)
                        .map_or(false, |job| job.state.is_finished() && now - job.updated_at >= ttl)
                })
                .copied()
                .collect();
            for id in expired {
                self.remove(&id);
                evicted += 1;
            }
        }

        if let Some(max) = config.max_entries {
            while self.jobs.len() >= max {
                let oldest_finished = self
                    .order
                    .iter()
                    .find(|id| self.jobs.get(id).map_or(false, |job| job.state.is_finished()))
                    .copied();
                match oldest_finished {
                    Some(id) => {
                        self.remove(&id);
                        evicted += 1;
                    }
                    None => break,
                }
            }
        }

        evicted
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Job registry held in process memory, lost on restart.
pub struct InMemoryJobStore {
    store: Arc<RwLock<MemoryStore>>,
    config: MemoryConfig,
}

impl InMemoryJobStore {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new(MemoryConfig::new())
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self) -> Result<JobId> {
        let mut store = self.store.write().await;
        let evicted = store.evict(&self.config, Utc::now());
        if evicted > 0 {
            tracing::debug!("Evicted {} finished jobs", evicted);
        }
        Ok(store.insert(Job::new()))
    }

    async fn get(&self, id: &JobId) -> Result<Job> {
        let store = self.store.read().await;
        store.get(id)
    }

    async fn mark_completed(&self, id: &JobId, result: Value) -> Result<()> {
        let mut store = self.store.write().await;
        store.finish(id, JobState::Completed { result })
    }

    async fn mark_failed(&self, id: &JobId, error_message: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.finish(
            id,
            JobState::Failed {
                error_message: error_message.to_string(),
            },
        )
    }

    async fn len(&self) -> usize {
        self.store.read().await.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prm_core::JobStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_starts_pending() {
        let storage = InMemoryJobStore::default();
        let id = storage.create().await.unwrap();
        let job = storage.get(&id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Pending);
        assert!(job.result().is_none());
        assert!(job.error_message().is_none());
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let storage = InMemoryJobStore::default();
        let err = storage.get(&JobId::new()).await.unwrap_err();
        assert!(matches!(err, Error::JobNotFound(_)));
        let err = storage.mark_failed(&JobId::new(), "x").await.unwrap_err();
        assert!(matches!(err, Error::JobNotFound(_)));
    }

    #[tokio::test]
    async fn test_job_is_finished_only_once() {
        let storage = InMemoryJobStore::default();
        let id = storage.create().await.unwrap();
        storage.mark_completed(&id, json!({"count": 0})).await.unwrap();

        let err = storage.mark_failed(&id, "late failure").await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let job = storage.get(&id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.result(), Some(&json!({"count": 0})));
        assert!(job.error_message().is_none());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_finished_job() {
        let storage = InMemoryJobStore::new(MemoryConfig::new().with_max_entries(2));
        let first = storage.create().await.unwrap();
        let second = storage.create().await.unwrap();
        storage.mark_completed(&second, json!(null)).await.unwrap();
        storage.mark_failed(&first, "boom").await.unwrap();

        let third = storage.create().await.unwrap();
        assert_eq!(storage.len().await, 2);
        assert!(storage.get(&first).await.is_err());
        assert!(storage.get(&second).await.is_ok());
        assert!(storage.get(&third).await.is_ok());
    }

    #[tokio::test]
    async fn test_capacity_never_evicts_pending_jobs() {
        let storage = InMemoryJobStore::new(MemoryConfig::new().with_max_entries(1));
        let first = storage.create().await.unwrap();
        let second = storage.create().await.unwrap();
        assert_eq!(storage.len().await, 2);
        assert!(storage.get(&first).await.is_ok());
        assert!(storage.get(&second).await.is_ok());
    }

    #[tokio::test]
    async fn test_ttl_expires_finished_jobs() {
        let storage = InMemoryJobStore::new(MemoryConfig::new().with_ttl(Duration::ZERO));
        let done = storage.create().await.unwrap();
        let pending = storage.create().await.unwrap();
        storage.mark_completed(&done, json!([])).await.unwrap();

        let _ = storage.create().await.unwrap();
        assert!(storage.get(&done).await.is_err());
        assert!(storage.get(&pending).await.is_ok());
    }
}
