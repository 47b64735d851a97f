use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use prm_core::{
    ArticleRecord, DiscoveredLink, GenerationParams, InferenceModel, JobStore, Region, Result, Scraper,
    SourceMetadata,
};
use prm_inference::{AnalyzerConfig, ArticleAnalyzer};
use prm_jobs::JobRunner;
use prm_scrapers::{BoxedScraper, ScraperManager};
use prm_storage::{InMemoryJobStore, MemoryConfig};
use prm_web::{create_app, AppState};
use serde_json::{json, Value};
use tower::util::ServiceExt;

struct EmptySite;

#[async_trait]
impl Scraper for EmptySite {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "empty",
            region: Region {
                name: "China",
                emoji: "🇨🇳",
            },
        }
    }

    fn method(&self) -> &str {
        "DOM Scraping"
    }

    fn can_handle(&self, _url: &str) -> bool {
        true
    }

    fn listing_url(&self, page: usize) -> String {
        format!("https://empty.test/{}", page)
    }

    async fn discover(&self, _page: usize) -> Result<Vec<DiscoveredLink>> {
        Ok(Vec::new())
    }

    async fn extract(&self, link: &DiscoveredLink) -> Result<ArticleRecord> {
        Ok(ArticleRecord::from_link("China", link.clone(), None, String::new()))
    }
}

#[derive(Debug)]
struct SilentModel;

#[async_trait]
impl InferenceModel for SilentModel {
    fn name(&self) -> &str {
        "silent"
    }

    async fn complete(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
        Ok(String::new())
    }
}

fn app() -> (Router, Arc<dyn JobStore>) {
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new(MemoryConfig::new()));
    let scraper = ScraperManager::new(
        Box::new(|| -> Result<BoxedScraper> { Ok(Box::new(EmptySite)) }),
        5,
        Duration::ZERO,
    );
    let analyzer = ArticleAnalyzer::new(Arc::new(SilentModel), AnalyzerConfig::default());
    let runner = Arc::new(JobRunner::new(store.clone(), scraper, analyzer, None));
    (create_app(AppState::new(runner)), store)
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_root() {
    let (app, _) = app();
    let (status, body) = send(app, "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_scrape_returns_job_and_status_url() {
    let (app, store) = app();
    let (status, body) = send(app.clone(), "POST", "/china/scrape?pages=2").await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let job_id = body["job_id"].as_str().unwrap().to_string();
    assert_eq!(body["status_url"], format!("/status/{}", job_id));
    assert_eq!(store.len().await, 1);

    let (status, body) = send(app, "GET", &format!("/status/{}", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(["pending", "completed"].contains(&body["status"].as_str().unwrap()));
}

#[tokio::test]
async fn test_scrape_defaults_to_one_page() {
    let (app, _) = app();
    let (status, _) = send(app, "POST", "/china/scrape").await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_zero_pages_is_rejected() {
    let (app, store) = app();
    let (status, body) = send(app, "POST", "/china/scrape?pages=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_completed_job_status() {
    let (app, store) = app();
    let job_id = store.create().await.unwrap();
    store
        .mark_completed(&job_id, json!({"country": "China", "method": "DOM Scraping", "count": 0, "data": []}))
        .await
        .unwrap();

    let (status, body) = send(app, "GET", &format!("/china/scrape/status/{}", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"]["count"], 0);
    assert_eq!(body["error_message"], Value::Null);
}

#[tokio::test]
async fn test_failed_job_status() {
    let (app, store) = app();
    let job_id = store.create().await.unwrap();
    store.mark_failed(&job_id, "browser crashed").await.unwrap();

    let (_, body) = send(app, "GET", &format!("/status/{}", job_id)).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["result"], Value::Null);
    assert_eq!(body["error_message"], "browser crashed");
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let (app, _) = app();
    let (status, body) = send(app.clone(), "GET", "/status/6f1c2a52-58c4-4c1e-9d3e-3b7f1f6d2a10").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Job not found"}));

    let (status, _) = send(app, "GET", "/status/not-a-job").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
