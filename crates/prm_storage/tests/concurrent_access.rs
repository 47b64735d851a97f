use std::sync::Arc;

use futures::future::join_all;
use prm_core::{JobStatus, JobStore};
use prm_storage::InMemoryJobStore;
use serde_json::json;

#[tokio::test]
async fn test_readers_see_exactly_one_state_while_writer_finishes() {
    let store = Arc::new(InMemoryJobStore::default());
    let id = store.create().await.unwrap();

    let readers: Vec<_> = (0..32)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                let job = store.get(&id).await.unwrap();
                match job.status() {
                    JobStatus::Pending => job.result().is_none() && job.error_message().is_none(),
                    JobStatus::Completed => job.result().is_some() && job.error_message().is_none(),
                    JobStatus::Failed => job.result().is_none() && job.error_message().is_some(),
                }
            })
        })
        .collect();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move { store.mark_completed(&id, json!({"count": 1})).await })
    };

    for consistent in join_all(readers).await {
        assert!(consistent.unwrap());
    }
    writer.await.unwrap().unwrap();
    assert_eq!(store.get(&id).await.unwrap().status(), JobStatus::Completed);
}

#[tokio::test]
async fn test_many_jobs_get_distinct_ids() {
    let store = Arc::new(InMemoryJobStore::default());
    let ids = join_all((0..50).map(|_| {
        let store = store.clone();
        async move { store.create().await.unwrap() }
    }))
    .await;

    let mut unique = ids.clone();
    unique.sort_by_key(|id| id.to_string());
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
    assert_eq!(store.len().await, 50);
}
