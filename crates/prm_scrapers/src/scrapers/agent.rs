use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use prm_core::{
    ArticleRecord, DiscoveredLink, Error, GenerationParams, InferenceModel, Result, Scraper, SourceMetadata,
};
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use super::china::{listing_url, REGION};
use super::utils::{clean_content, inner_text, json_block, text_content};
use crate::fetch::HttpFetcher;
use crate::logging::Logger;

lazy_static! {
    static ref BODY: Selector = Selector::parse("body").unwrap();
    static ref ANCHOR: Selector = Selector::parse("a[href]").unwrap();
}

const EXTRACTION_PARAMS: GenerationParams = GenerationParams::new(0.0, 4000);

/// Page text handed to the model is capped to keep prompts bounded.
const MAX_PAGE_CHARS: usize = 12_000;
const MAX_ANCHORS: usize = 200;

#[derive(Debug, Deserialize)]
struct AgentDetail {
    #[serde(default)]
    fwzh: Option<String>,
    #[serde(default)]
    content: String,
}

/// Scraper that lets a language model read the page instead of relying on
/// fixed selectors. Slower and costlier, but tolerant of layout changes.
#[derive(Debug, Clone)]
pub struct AgentScraper {
    model: Arc<dyn InferenceModel>,
    fetcher: HttpFetcher,
    max_content_chars: usize,
    logger: Logger,
}

impl AgentScraper {
    pub fn new(model: Arc<dyn InferenceModel>, timeout: Duration, max_content_chars: usize) -> Result<Self> {
        Ok(Self {
            model,
            fetcher: HttpFetcher::new(timeout)?,
            max_content_chars,
            logger: Logger::new().with_prefix("[China Scraper]").with_prefix("[Agent]"),
        })
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        let reply = self.model.complete(prompt, &EXTRACTION_PARAMS).await?;
        if reply.trim().is_empty() {
            return Err(Error::Scraping(format!("{} returned an empty reply", self.model.name())));
        }
        Ok(reply)
    }
}

#[async_trait]
impl Scraper for AgentScraper {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "中国政府网",
            region: REGION,
        }
    }

    fn method(&self) -> &str {
        "LLM Agent"
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("gov.cn")
    }

    fn listing_url(&self, page: usize) -> String {
        listing_url(page)
    }

    async fn discover(&self, page: usize) -> Result<Vec<DiscoveredLink>> {
        let url = self.listing_url(page);
        self.logger.info(&format!("Navigating to {}", url));
        let html = self.fetcher.fetch(&url).await?;
        let snapshot = PageSnapshot::from_html(&html);

        let reply = self.ask(&snapshot.listing_prompt()).await?;
        let links = parse_links(&reply, &url)?;
        self.logger.info(&format!("Model found {} articles on page {}", links.len(), page));
        Ok(links)
    }

    async fn extract(&self, link: &DiscoveredLink) -> Result<ArticleRecord> {
        self.logger.info(&format!("Fetching details for: {}", link.maintitle));
        let html = self.fetcher.fetch(&link.pub_url).await?;
        let snapshot = PageSnapshot::from_html(&html);

        let reply = self.ask(&snapshot.detail_prompt()).await?;
        let detail = parse_detail(&reply)?;
        let fwzh = detail.fwzh.map(|f| f.trim().to_string()).filter(|f| !f.is_empty());
        let content = clean_content(&detail.content, self.max_content_chars);
        Ok(ArticleRecord::from_link(REGION.name, link.clone(), fwzh, content))
    }
}

/// Page reduced to what the model needs: visible text and the anchors on it.
#[derive(Debug, Default)]
struct PageSnapshot {
    text: String,
    anchors: Vec<(String, String)>,
}

impl PageSnapshot {
    fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let text: String = document
            .select(&BODY)
            .next()
            .map(inner_text)
            .unwrap_or_default()
            .chars()
            .take(MAX_PAGE_CHARS)
            .collect();
        let anchors = document
            .select(&ANCHOR)
            .filter_map(|a| {
                let href = a.value().attr("href")?.trim().to_string();
                let label = text_content(a);
                (!label.is_empty()).then_some((label, href))
            })
            .take(MAX_ANCHORS)
            .collect();
        Self { text, anchors }
    }

    fn anchor_list(&self) -> String {
        self.anchors
            .iter()
            .map(|(label, href)| format!("- {} -> {}", label, href))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn listing_prompt(&self) -> String {
        format!(
            "The following is the text of a Chinese government policy listing page, followed by its links.\n\
             List every policy article on the page. Respond with only a JSON array of objects with the \
             keys \"maintitle\", \"pub_url\" and \"publish_date\" (YYYY-MM-DD), using the hrefs exactly as \
             given.\n\nPage text:\n{}\n\nLinks:\n{}",
            self.text,
            self.anchor_list()
        )
    }

    fn detail_prompt(&self) -> String {
        format!(
            "The following is the text of a Chinese government policy document page.\n\
             Respond with only a JSON object with the keys \"fwzh\" (the document number labelled \
             发文字号, such as 国发〔2025〕12号, or null when the page has none) and \"content\" (the full \
             body text of the document, without navigation or metadata).\n\nPage text:\n{}",
            self.text
        )
    }
}

fn parse_links(reply: &str, listing_url: &str) -> Result<Vec<DiscoveredLink>> {
    let block = json_block(reply, '[', ']')
        .ok_or_else(|| Error::Scraping("Model reply contains no JSON array of links".to_string()))?;
    let raw: Vec<DiscoveredLink> = serde_json::from_str(block)?;

    let base = Url::parse(listing_url)?;
    Ok(raw
        .into_iter()
        .filter_map(|link| {
            let url = base.join(link.pub_url.trim()).ok()?;
            Some(DiscoveredLink {
                maintitle: link.maintitle.trim().to_string(),
                pub_url: url.to_string(),
                publish_date: link.publish_date.trim().to_string(),
            })
        })
        .collect())
}

fn parse_detail(reply: &str) -> Result<AgentDetail> {
    let block = json_block(reply, '{', '}')
        .ok_or_else(|| Error::Scraping("Model reply contains no JSON object".to_string()))?;
    Ok(serde_json::from_str(block)?)
}
