use std::sync::Arc;

use prm_core::JobStore;
use prm_jobs::JobRunner;

pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub runner: Arc<JobRunner>,
}

impl AppState {
    /// Serve jobs from the same store the runner writes to.
    pub fn new(runner: Arc<JobRunner>) -> Self {
        Self {
            store: runner.store().clone(),
            runner,
        }
    }
}
