//! Relevance analysis of a single scraped article.
//!
//! The pipeline is a small state machine:
//!
//! ```text
//! Translating ─► Scoring ─┬─► Rejected
//!                         └─► Elaborating ─► Done
//! ```
//!
//! The relevance gate sits between scoring and elaboration, so a rejected
//! article costs exactly two model calls.

use std::fmt;
use std::sync::Arc;

use prm_core::config::InferenceSettings;
use prm_core::{AnalysisResult, ArticleRecord, Error, GenerationParams, InferenceModel, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod parse;
pub mod prompts;

pub use parse::{parse_relevance_score, parse_tags, UNSCORED};

pub const HEADLINE_PLACEHOLDER: &str = "Headline unavailable.";
pub const SUMMARY_PLACEHOLDER: &str = "Summary unavailable.";
pub const TAGS_PLACEHOLDER: &str = "Uncategorized";

/// Why a single model call produced nothing usable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("model returned an empty reply")]
    Empty,
    #[error("model call failed: {0}")]
    Model(String),
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub relevance_threshold: i32,
    pub max_tags: usize,
}

impl AnalyzerConfig {
    pub fn from_settings(settings: &InferenceSettings) -> Self {
        Self {
            relevance_threshold: settings.relevance_threshold,
            max_tags: settings.max_tags,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 5,
            max_tags: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Kept(AnalysisResult),
    Rejected { score: i32 },
}

impl AnalysisOutcome {
    pub fn into_kept(self) -> Option<AnalysisResult> {
        match self {
            AnalysisOutcome::Kept(result) => Some(result),
            AnalysisOutcome::Rejected { .. } => None,
        }
    }
}

enum Stage {
    Translating,
    Scoring { translated: String },
    Elaborating { translated: String, score: i32 },
    Rejected { score: i32 },
    Done(AnalysisResult),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Translating => write!(f, "translating"),
            Stage::Scoring { .. } => write!(f, "scoring"),
            Stage::Elaborating { score, .. } => write!(f, "elaborating (score {})", score),
            Stage::Rejected { score } => write!(f, "rejected (score {})", score),
            Stage::Done(_) => write!(f, "done"),
        }
    }
}

pub struct ArticleAnalyzer {
    model: Arc<dyn InferenceModel>,
    config: AnalyzerConfig,
}

impl fmt::Debug for ArticleAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticleAnalyzer")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ArticleAnalyzer {
    pub fn new(model: Arc<dyn InferenceModel>, config: AnalyzerConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run the full pipeline for one article.
    ///
    /// Returns `Err` only when the article could not be translated; a low or
    /// unreadable relevance score is reported as `Rejected`.
    pub async fn analyze(&self, article: &ArticleRecord) -> Result<AnalysisOutcome> {
        let mut stage = Stage::Translating;
        loop {
            debug!("[Analyzer] {} -> {}", article.maintitle, stage);
            stage = match stage {
                Stage::Translating => {
                    let translated = self.translate(article).await.map_err(|e| {
                        Error::Inference(format!("Translation failed for '{}': {}", article.maintitle, e))
                    })?;
                    Stage::Scoring { translated }
                }
                Stage::Scoring { translated } => {
                    let score = self.score(&translated).await;
                    if score < self.config.relevance_threshold {
                        Stage::Rejected { score }
                    } else {
                        Stage::Elaborating { translated, score }
                    }
                }
                Stage::Elaborating { translated, score } => Stage::Done(self.elaborate(&translated, score).await),
                Stage::Rejected { score } => {
                    info!(
                        "[Analyzer] Rejected '{}' (score {} < {})",
                        article.maintitle, score, self.config.relevance_threshold
                    );
                    return Ok(AnalysisOutcome::Rejected { score });
                }
                Stage::Done(result) => {
                    info!("[Analyzer] Kept '{}' (score {})", article.maintitle, result.relevance_score);
                    return Ok(AnalysisOutcome::Kept(result));
                }
            };
        }
    }

    async fn ask(&self, prompt: &str, params: &GenerationParams) -> std::result::Result<String, StepError> {
        let reply = self
            .model
            .complete(prompt, params)
            .await
            .map_err(|e| StepError::Model(e.to_string()))?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(StepError::Empty);
        }
        Ok(reply.to_string())
    }

    async fn translate(&self, article: &ArticleRecord) -> std::result::Result<String, StepError> {
        self.ask(&prompts::translation_prompt(article), &prompts::TRANSLATION_PARAMS)
            .await
    }

    async fn score(&self, translated: &str) -> i32 {
        match self
            .ask(&prompts::relevance_prompt(translated), &prompts::RELEVANCE_PARAMS)
            .await
        {
            Ok(reply) => {
                let score = parse_relevance_score(&reply);
                if score == UNSCORED {
                    warn!("[Analyzer] No relevance score in reply: {:?}", reply);
                }
                score
            }
            Err(e) => {
                warn!("[Analyzer] Relevance scoring failed: {}", e);
                UNSCORED
            }
        }
    }

    async fn elaborate(&self, translated: &str, score: i32) -> AnalysisResult {
        let headline_prompt = prompts::headline_prompt(translated);
        let summary_prompt = prompts::summary_prompt(translated);
        let tags_prompt = prompts::tags_prompt(translated, self.config.max_tags);

        let (headline, summary, tags) = tokio::join!(
            self.ask(&headline_prompt, &prompts::HEADLINE_PARAMS),
            self.ask(&summary_prompt, &prompts::SUMMARY_PARAMS),
            self.ask(&tags_prompt, &prompts::TAGS_PARAMS),
        );

        let headline = headline.unwrap_or_else(|e| {
            warn!("[Analyzer] Headline generation failed: {}", e);
            HEADLINE_PLACEHOLDER.to_string()
        });
        let summary = summary.unwrap_or_else(|e| {
            warn!("[Analyzer] Summary generation failed: {}", e);
            SUMMARY_PLACEHOLDER.to_string()
        });
        let tags = match tags {
            Ok(reply) => {
                let tags = parse_tags(&reply, self.config.max_tags);
                if tags.is_empty() {
                    vec![TAGS_PLACEHOLDER.to_string()]
                } else {
                    tags
                }
            }
            Err(e) => {
                warn!("[Analyzer] Tag generation failed: {}", e);
                vec![TAGS_PLACEHOLDER.to_string()]
            }
        };

        AnalysisResult {
            headline,
            summary,
            tags,
            relevance_score: score,
        }
    }
}
