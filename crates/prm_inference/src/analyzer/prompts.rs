//! Prompt templates for each step of the article analysis pipeline.

use prm_core::{ArticleRecord, GenerationParams};

pub const TRANSLATION_PARAMS: GenerationParams = GenerationParams::new(0.2, 8000);
pub const RELEVANCE_PARAMS: GenerationParams = GenerationParams::new(0.0, 16);
pub const HEADLINE_PARAMS: GenerationParams = GenerationParams::new(0.9, 200);
pub const SUMMARY_PARAMS: GenerationParams = GenerationParams::new(0.5, 1200);
pub const TAGS_PARAMS: GenerationParams = GenerationParams::new(0.3, 200);

pub fn translation_prompt(article: &ArticleRecord) -> String {
    format!(
        r#"Translate the following government press release into clear, faithful English.
Keep names, numbers, dates and document numbers exactly as they appear.
Return only the translated text, with no commentary.

Title: {title}

{content}"#,
        title = article.maintitle,
        content = article.content
    )
}

pub fn relevance_prompt(translated: &str) -> String {
    format!(
        r#"You are assessing how significant a press release is for readers who follow world affairs.

----------
{translated}
----------

Rate its global significance on a scale from 1 to 7:
1 = purely local or administrative, no relevance outside the country
4 = of moderate interest to foreign observers
7 = major development with clear international implications

Respond with a single integer between 1 and 7 and nothing else."#
    )
}

pub fn headline_prompt(translated: &str) -> String {
    format!(
        r#"Write a headline for the following press release.
The headline must be exactly two sentences: the first states what happened, the second why it matters.
Return only the two sentences.

----------
{translated}
----------"#
    )
}

pub fn summary_prompt(translated: &str) -> String {
    format!(
        r#"Summarize the following press release in exactly two paragraphs of 3 to 5 sentences each.
The first paragraph explains what the release says.
The second paragraph explains its broader relevance and likely implications.
Return only the two paragraphs, separated by a blank line.

----------
{translated}
----------"#
    )
}

pub fn tags_prompt(translated: &str, max_tags: usize) -> String {
    format!(
        r#"List up to {max_tags} short topical tags (for example "trade", "energy", "public health") for the following press release.
Respond with a JSON array of strings only, such as ["trade", "energy"].

----------
{translated}
----------"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_prompt_embeds_title_and_content() {
        let article = ArticleRecord {
            country: "China".to_string(),
            maintitle: "国务院关于印发通知".to_string(),
            pub_url: "https://www.gov.cn/a.htm".to_string(),
            publish_date: "2025-01-02".to_string(),
            fwzh: None,
            content: "正文内容".to_string(),
        };
        let prompt = translation_prompt(&article);
        assert!(prompt.contains("Title: 国务院关于印发通知"));
        assert!(prompt.contains("正文内容"));
    }

    #[test]
    fn test_tags_prompt_states_limit() {
        assert!(tags_prompt("text", 3).contains("up to 3"));
    }

    #[test]
    fn test_headline_is_sampled_warmer_than_scoring() {
        assert!(HEADLINE_PARAMS.temperature > RELEVANCE_PARAMS.temperature);
    }
}
