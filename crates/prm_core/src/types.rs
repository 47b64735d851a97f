use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque identifier handed out for every scrape job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle of a job. The payload lives on the variant, so a job can never
/// carry a result and an error at the same time.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Completed { result: Value },
    Failed { error_message: String },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Pending => JobStatus::Pending,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, JobState::Pending)
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            state: JobState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.state {
            JobState::Completed { result } => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { error_message } => Some(error_message),
            _ => None,
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire shape of a job as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    pub result: Option<Value>,
    pub error_message: Option<String>,
}

impl From<&Job> for JobStatusView {
    fn from(job: &Job) -> Self {
        Self {
            status: job.status(),
            result: job.result().cloned(),
            error_message: job.error_message().map(str::to_string),
        }
    }
}

/// A link found on a listing page, before its detail page was visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredLink {
    pub maintitle: String,
    pub pub_url: String,
    pub publish_date: String,
}

/// One press release as scraped from the source site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub country: String,
    pub maintitle: String,
    pub pub_url: String,
    pub publish_date: String,
    pub fwzh: Option<String>,
    pub content: String,
}

impl ArticleRecord {
    pub fn from_link(country: &str, link: DiscoveredLink, fwzh: Option<String>, content: String) -> Self {
        Self {
            country: country.to_string(),
            maintitle: link.maintitle,
            pub_url: link.pub_url,
            publish_date: link.publish_date,
            fwzh,
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub headline: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub relevance_score: i32,
}

/// An article that passed the relevance gate, together with its analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedArticle {
    pub article: ArticleRecord,
    pub analysis: AnalysisResult,
}

/// Result envelope stored on a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub country: String,
    pub method: String,
    pub count: usize,
    pub data: Vec<AnalyzedArticle>,
}

impl JobSummary {
    pub fn new(country: &str, method: &str, data: Vec<AnalyzedArticle>) -> Self {
        Self {
            country: country.to_string(),
            method: method.to_string(),
            count: data.len(),
            data,
        }
    }
}
