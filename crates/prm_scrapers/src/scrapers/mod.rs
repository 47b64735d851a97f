use std::sync::Arc;

use prm_core::config::{ScrapeMethod, ScraperSettings};
use prm_core::{Error, InferenceModel, Result, Scraper};

pub mod agent;
pub mod china;

use agent::AgentScraper;
use china::GovCnScraper;

pub type BoxedScraper = Box<dyn Scraper>;

/// Builds a fresh scraper session for one run. Failing here means the run
/// cannot start at all.
pub type ScraperFactory = Box<dyn Fn() -> Result<BoxedScraper> + Send + Sync>;

/// Pick the scraper implementation named by the settings. The agent method
/// needs a language model.
pub fn create_scraper_factory(
    settings: &ScraperSettings,
    model: Option<Arc<dyn InferenceModel>>,
) -> Result<ScraperFactory> {
    let timeout = settings.request_timeout;
    let max_chars = settings.max_content_chars;
    match settings.method {
        ScrapeMethod::Dom => Ok(Box::new(move || -> Result<BoxedScraper> {
            Ok(Box::new(GovCnScraper::new(timeout, max_chars)?))
        })),
        ScrapeMethod::Agent => {
            let model = model.ok_or_else(|| {
                Error::Config("The agent scrape method requires a configured language model".to_string())
            })?;
            Ok(Box::new(move || -> Result<BoxedScraper> {
                Ok(Box::new(AgentScraper::new(model.clone(), timeout, max_chars)?))
            }))
        }
    }
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use lazy_static::lazy_static;
    use regex::Regex;
    use scraper::{ElementRef, Node};

    lazy_static! {
        static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    }

    /// Concatenated text of an element, trimmed (DOM `textContent`).
    pub fn text_content(element: ElementRef<'_>) -> String {
        element.text().collect::<String>().trim().to_string()
    }

    const BLOCK_ELEMENTS: [&str; 21] = [
        "address", "article", "blockquote", "div", "dl", "dt", "dd", "h1", "h2", "h3", "h4", "h5", "h6", "li",
        "ol", "p", "section", "table", "td", "th", "tr",
    ];

    /// Rendered text of an element, close to the DOM `innerText`: inline
    /// markup is concatenated as-is, block elements and `<br>` start a new
    /// line. Lines are trimmed and blank ones dropped.
    pub fn inner_text(element: ElementRef<'_>) -> String {
        let mut raw = String::new();
        push_rendered(element, &mut raw);
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push_rendered(element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) if el.name() == "br" => out.push('\n'),
                Node::Element(el) => {
                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let block = BLOCK_ELEMENTS.contains(&el.name());
                    if block {
                        out.push('\n');
                    }
                    push_rendered(child, out);
                    if block {
                        out.push('\n');
                    }
                }
                _ => {}
            }
        }
    }

    /// First element sibling after `element`.
    pub fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
        element.next_siblings().find_map(ElementRef::wrap)
    }

    /// Collapse whitespace runs and cap the length at `max_chars`
    /// characters, marking a cut with `...`.
    pub fn clean_content(content: &str, max_chars: usize) -> String {
        let collapsed = WHITESPACE.replace_all(content, " ");
        let collapsed = collapsed.trim();
        if collapsed.chars().count() > max_chars {
            let mut truncated: String = collapsed.chars().take(max_chars).collect();
            truncated.push_str("...");
            truncated
        } else {
            collapsed.to_string()
        }
    }

    /// Slice out the outermost `open`..`close` block of a model reply, which
    /// may wrap its JSON in prose or a code fence.
    pub fn json_block(text: &str, open: char, close: char) -> Option<&str> {
        let start = text.find(open)?;
        let end = text.rfind(close)?;
        (end > start).then(|| &text[start..=end])
    }
}
