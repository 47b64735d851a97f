use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use prm_core::{ArticleRecord, DiscoveredLink, Result, Scraper, SourceMetadata};
use scraper::{Html, Selector};
use url::Url;

use super::{document_number, listing_url, REGION};
use crate::fetch::HttpFetcher;
use crate::logging::Logger;
use crate::scrapers::utils::{clean_content, inner_text, next_element_sibling, text_content};

lazy_static! {
    static ref NEWS_BOX: Selector = Selector::parse("div.news_box").unwrap();
    static ref LISTING_ITEM: Selector = Selector::parse("div.news_box .list_2 ul > li").unwrap();
    static ref ANCHOR: Selector = Selector::parse("a").unwrap();
    static ref DATE: Selector = Selector::parse("span.date").unwrap();
    static ref BODY: Selector = Selector::parse("body").unwrap();
    static ref TITLE: Selector = Selector::parse("h1, .article-title, .pages-title").unwrap();
    static ref PRIMARY_CONTENT: Selector = Selector::parse("#UCAP-CONTENT").unwrap();
    static ref PAGES_CONTENT: Selector = Selector::parse(".pages_content").unwrap();
    static ref PAGES_ARTICLE: Selector = Selector::parse(".article, .TRS_Editor, .Custom_UnionStyle").unwrap();
    static ref PARAGRAPH: Selector = Selector::parse("p").unwrap();
    static ref METADATA_TABLE: Selector = Selector::parse(".bd1").unwrap();
    static ref ALTERNATIVE_CONTENT: Vec<Selector> = [
        ".article-content",
        ".content-text",
        ".main-content",
        ".text-content",
        ".detail-content",
        ".view_content",
        "#UCAP-CONTENT-FORPRINT",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect();
}

const METADATA_MARKERS: [&str; 2] = ["发文字号", "索 引 号"];

/// Fields pulled out of an article's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDetail {
    pub title: Option<String>,
    pub fwzh: Option<String>,
    pub content: String,
}

/// Selector-based scraper for the gov.cn policy listing.
#[derive(Debug, Clone)]
pub struct GovCnScraper {
    fetcher: HttpFetcher,
    max_content_chars: usize,
    logger: Logger,
}

impl GovCnScraper {
    pub fn new(timeout: Duration, max_content_chars: usize) -> Result<Self> {
        Ok(Self {
            fetcher: HttpFetcher::new(timeout)?,
            max_content_chars,
            logger: Logger::new().with_prefix("[China Scraper]"),
        })
    }
}

#[async_trait]
impl Scraper for GovCnScraper {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "中国政府网",
            region: REGION,
        }
    }

    fn method(&self) -> &str {
        "DOM Scraping"
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

        let links = parse_listing(&html, &url)?;
        if links.is_empty() {
            let document = Html::parse_document(&html);
            if document.select(&NEWS_BOX).next().is_none() {
                let preview: String = document
                    .select(&BODY)
                    .next()
                    .map(inner_text)
                    .unwrap_or_default()
                    .chars()
                    .take(500)
                    .collect();
                self.logger.warn(&format!("No news_box on page {}, body preview: {}", page, preview));
            }
        }
        self.logger.info(&format!("Found {} articles on page {}", links.len(), page));
        Ok(links)
    }

    async fn extract(&self, link: &DiscoveredLink) -> Result<ArticleRecord> {
        self.logger.info(&format!("Fetching details for: {}", link.maintitle));
        let html = self.fetcher.fetch(&link.pub_url).await?;
        let detail = parse_detail(&html, self.max_content_chars);

        let mut link = link.clone();
        if link.maintitle.is_empty() {
            link.maintitle = detail.title.unwrap_or_default();
        }
        Ok(ArticleRecord::from_link(REGION.name, link, detail.fwzh, detail.content))
    }
}

/// Pull `(title, url, date)` triples out of a listing page. Relative links
/// are resolved against `listing_url`; items without a link or a date are
/// skipped.
pub fn parse_listing(html: &str, listing_url: &str) -> Result<Vec<DiscoveredLink>> {
    let base = Url::parse(listing_url)?;
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    for item in document.select(&LISTING_ITEM) {
        let (Some(anchor), Some(date)) = (item.select(&ANCHOR).next(), item.select(&DATE).next()) else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        match base.join(href.trim()) {
            Ok(url) => links.push(DiscoveredLink {
                maintitle: text_content(anchor),
                pub_url: url.to_string(),
                publish_date: text_content(date),
            }),
            Err(e) => tracing::debug!("Skipping unparseable link {}: {}", href, e),
        }
    }
    Ok(links)
}

pub fn parse_detail(html: &str, max_content_chars: usize) -> ArticleDetail {
    let document = Html::parse_document(html);
    ArticleDetail {
        title: document
            .select(&TITLE)
            .next()
            .map(text_content)
            .filter(|t| !t.is_empty()),
        fwzh: document_number::extract_document_number(&document),
        content: clean_content(&extract_content(&document), max_content_chars),
    }
}

/// Article body, trying each known layout in turn. Empty when none match.
pub fn extract_content(document: &Html) -> String {
    primary_container(document)
        .or_else(|| pages_content(document))
        .or_else(|| alternative_containers(document))
        .or_else(|| after_metadata_table(document))
        .unwrap_or_default()
}

fn non_empty(text: String) -> Option<String> {
    (!text.trim().is_empty()).then_some(text)
}

fn primary_container(document: &Html) -> Option<String> {
    document.select(&PRIMARY_CONTENT).next().map(inner_text).and_then(non_empty)
}

fn pages_content(document: &Html) -> Option<String> {
    let container = document.select(&PAGES_CONTENT).next()?;
    if let Some(article) = container.select(&PAGES_ARTICLE).next() {
        return non_empty(inner_text(article));
    }

    let paragraphs: Vec<String> = container
        .select(&PARAGRAPH)
        .map(inner_text)
        .filter(|text| !text.is_empty() && !METADATA_MARKERS.iter().any(|m| text.contains(m)))
        .collect();
    non_empty(paragraphs.join("\n\n"))
}

fn alternative_containers(document: &Html) -> Option<String> {
    ALTERNATIVE_CONTENT
        .iter()
        .filter_map(|selector| document.select(selector).next())
        .map(inner_text)
        .find_map(non_empty)
}

/// Some documents put the body in the first element after the `.bd1`
/// metadata table.
fn after_metadata_table(document: &Html) -> Option<String> {
    let table = document.select(&METADATA_TABLE).next()?;
    let mut current = next_element_sibling(table);
    while let Some(element) = current {
        if let Some(text) = non_empty(inner_text(element)) {
            return Some(text);
        }
        current = next_element_sibling(element);
    }
    None
}
