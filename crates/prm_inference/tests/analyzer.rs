use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use prm_core::{ArticleRecord, Error, GenerationParams, InferenceModel, Result};
use prm_inference::analyzer::{HEADLINE_PLACEHOLDER, TAGS_PLACEHOLDER, UNSCORED};
use prm_inference::{AnalysisOutcome, AnalyzerConfig, ArticleAnalyzer};

/// Answers each pipeline prompt with a canned reply; `None` makes that call fail.
#[derive(Debug, Default)]
struct ScriptedModel {
    translation: Option<String>,
    score: Option<String>,
    headline: Option<String>,
    summary: Option<String>,
    tags: Option<String>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedModel {
    fn accepting(score: &str) -> Self {
        Self {
            translation: Some("The State Council issued a notice.".to_string()),
            score: Some(score.to_string()),
            headline: Some("The State Council acted. It matters.".to_string()),
            summary: Some("First paragraph.\n\nSecond paragraph.".to_string()),
            tags: Some(r#"["policy","economy"]"#.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        let (step, reply) = if prompt.starts_with("Translate") {
            ("translate", &self.translation)
        } else if prompt.contains("global significance") {
            ("score", &self.score)
        } else if prompt.starts_with("Write a headline") {
            ("headline", &self.headline)
        } else if prompt.starts_with("Summarize") {
            ("summary", &self.summary)
        } else {
            ("tags", &self.tags)
        };
        self.calls.lock().unwrap().push(step);
        reply
            .clone()
            .ok_or_else(|| Error::Inference(format!("{} unavailable", step)))
    }
}

fn article() -> ArticleRecord {
    ArticleRecord {
        country: "China".to_string(),
        maintitle: "国务院关于印发若干措施的通知".to_string(),
        pub_url: "https://www.gov.cn/zhengce/content/202501/content_1.htm".to_string(),
        publish_date: "2025-01-15".to_string(),
        fwzh: Some("国发〔2025〕1号".to_string()),
        content: "各省、自治区、直辖市人民政府……".to_string(),
    }
}

fn analyzer(model: Arc<ScriptedModel>, threshold: i32) -> ArticleAnalyzer {
    ArticleAnalyzer::new(
        model,
        AnalyzerConfig {
            relevance_threshold: threshold,
            max_tags: 5,
        },
    )
}

#[tokio::test]
async fn test_score_below_threshold_is_rejected_before_elaboration() {
    let model = Arc::new(ScriptedModel::accepting("3"));
    let outcome = analyzer(model.clone(), 4).analyze(&article()).await.unwrap();

    assert_eq!(outcome, AnalysisOutcome::Rejected { score: 3 });
    assert_eq!(model.calls(), vec!["translate", "score"]);
}

#[tokio::test]
async fn test_score_at_threshold_is_kept() {
    let model = Arc::new(ScriptedModel::accepting("4"));
    let outcome = analyzer(model.clone(), 4).analyze(&article()).await.unwrap();

    let result = outcome.into_kept().expect("article should be kept");
    assert_eq!(result.relevance_score, 4);
    assert_eq!(result.headline, "The State Council acted. It matters.");
    assert_eq!(result.summary, "First paragraph.\n\nSecond paragraph.");
    assert_eq!(result.tags, vec!["policy", "economy"]);

    let calls = model.calls();
    assert_eq!(&calls[..2], &["translate", "score"]);
    assert_eq!(calls.len(), 5);
}

#[tokio::test]
async fn test_unreadable_score_is_rejected() {
    let model = Arc::new(ScriptedModel::accepting("very relevant"));
    let outcome = analyzer(model, 1).analyze(&article()).await.unwrap();
    assert_eq!(outcome, AnalysisOutcome::Rejected { score: UNSCORED });
}

#[tokio::test]
async fn test_failed_scoring_call_is_rejected() {
    let model = Arc::new(ScriptedModel {
        score: None,
        ..ScriptedModel::accepting("7")
    });
    let outcome = analyzer(model, 1).analyze(&article()).await.unwrap();
    assert_eq!(outcome, AnalysisOutcome::Rejected { score: UNSCORED });
}

#[tokio::test]
async fn test_empty_translation_aborts_article() {
    let model = Arc::new(ScriptedModel {
        translation: Some("   ".to_string()),
        ..ScriptedModel::accepting("7")
    });
    let err = analyzer(model.clone(), 4).analyze(&article()).await.unwrap_err();

    assert!(matches!(err, Error::Inference(_)));
    assert_eq!(model.calls(), vec!["translate"]);
}

#[tokio::test]
async fn test_elaboration_failures_fall_back_to_placeholders() {
    let model = Arc::new(ScriptedModel {
        headline: None,
        tags: Some("[trade, energy]".to_string()),
        ..ScriptedModel::accepting("6")
    });
    let result = analyzer(model, 4)
        .analyze(&article())
        .await
        .unwrap()
        .into_kept()
        .unwrap();

    assert_eq!(result.headline, HEADLINE_PLACEHOLDER);
    assert_eq!(result.tags, vec!["trade", "energy"]);
    assert_eq!(result.relevance_score, 6);
}

#[tokio::test]
async fn test_missing_tags_use_placeholder() {
    let model = Arc::new(ScriptedModel {
        tags: None,
        ..ScriptedModel::accepting("5")
    });
    let result = analyzer(model, 4)
        .analyze(&article())
        .await
        .unwrap()
        .into_kept()
        .unwrap();
    assert_eq!(result.tags, vec![TAGS_PLACEHOLDER]);
}
