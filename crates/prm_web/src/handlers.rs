use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use prm_core::{JobId, JobStatusView};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    #[serde(default = "default_pages")]
    pub pages: usize,
}

fn default_pages() -> usize {
    1
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeAccepted {
    pub job_id: JobId,
    pub status_url: String,
}

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "China press release monitor is running" }))
}

pub async fn start_scrape(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScrapeParams>,
) -> Result<impl IntoResponse, ApiError> {
    if params.pages == 0 {
        return Err(ApiError::BadRequest("pages must be at least 1".to_string()));
    }

    let job_id = state.runner.trigger(params.pages).await?;
    tracing::info!("[API] Accepted scrape of {} page(s) as job {}", params.pages, job_id);
    let accepted = ScrapeAccepted {
        status_url: format!("/status/{}", job_id),
        job_id,
    };
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusView>, ApiError> {
    // Ids that are not UUIDs cannot name a job either.
    let job_id: JobId = job_id.parse().map_err(|_| ApiError::JobNotFound)?;
    let job = state.store.get(&job_id).await?;
    Ok(Json(JobStatusView::from(&job)))
}
