pub mod analyzer;
pub mod models;

pub use analyzer::{AnalysisOutcome, AnalyzerConfig, ArticleAnalyzer};
pub use models::create_model;

pub mod prelude {
    pub use super::analyzer::{AnalysisOutcome, AnalyzerConfig, ArticleAnalyzer};
    pub use super::models::create_model;
    pub use prm_core::{AnalysisResult, ArticleRecord, Error, GenerationParams, InferenceModel, Result};
}
