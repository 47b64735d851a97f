//! Extraction of the official document number (发文字号), e.g. `国发〔2025〕12号`.
//!
//! Policy pages render the number in several layouts. The heuristics below
//! are tried in order and the first hit wins.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

use crate::scrapers::utils::{inner_text, next_element_sibling, text_content};

const LABEL: &str = "发文字号";
const INDEX_LABEL: &str = "索 引 号";

/// Titles of party and general-office documents, which carry no number.
const UNNUMBERED_ISSUERS: [&str; 3] = ["中共中央", "中办", "国办"];

lazy_static! {
    static ref DOCUMENT_NUMBER: Regex = Regex::new(r"[^〔\s:：]+〔\d{4}〕\d+号").unwrap();
    static ref LABELLED: Regex = Regex::new(r"发文字号[:：]\s*([^\n]+)").unwrap();
    static ref ROW: Selector = Selector::parse("tr").unwrap();
    static ref CELL: Selector = Selector::parse("td").unwrap();
    static ref MOBILE_ABSTRACT: Selector = Selector::parse(".pchide.abstract.mxxgkabstract").unwrap();
    static ref HEADING: Selector = Selector::parse("h2").unwrap();
    static ref BODY: Selector = Selector::parse("body").unwrap();
    static ref INFO_SECTIONS: Selector = Selector::parse(".pages_content table, .bd1, .table2").unwrap();
    static ref TITLE: Selector = Selector::parse("h1, .article-title, .pages-title").unwrap();
}

pub fn extract_document_number(document: &Html) -> Option<String> {
    let number = from_metadata_row(document)
        .or_else(|| from_mobile_abstract(document))
        .or_else(|| from_any_cell(document))
        .or_else(|| from_labelled_text(document))
        .or_else(|| from_info_sections(document));

    if number.is_none() && is_unnumbered_issuer(document) {
        tracing::debug!("No document number expected for party or general-office document");
    }
    number
}

/// Accept a labelled value unless it is really the neighbouring index field.
fn accept(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && !value.contains(INDEX_LABEL)).then(|| value.to_string())
}

/// Desktop layout: `<tr><td>发文字号：</td><td>国发〔2025〕1号</td></tr>`.
/// Only the first row whose leading cell carries the label is considered.
fn from_metadata_row(document: &Html) -> Option<String> {
    let row = document.select(&ROW).find(|row| {
        row.select(&CELL)
            .next()
            .map_or(false, |cell| text_content(cell).contains(LABEL))
    })?;
    let cell = row.select(&CELL).nth(1)?;
    accept(&text_content(cell))
}

/// Mobile layout: an `<h2>发文字号</h2>` followed by a `<p>` with the value.
fn from_mobile_abstract(document: &Html) -> Option<String> {
    let section = document.select(&MOBILE_ABSTRACT).next()?;
    section
        .select(&HEADING)
        .filter(|heading| text_content(*heading).contains(LABEL))
        .filter_map(next_element_sibling)
        .filter(|sibling| sibling.value().name() == "p")
        .find_map(|p| accept(&text_content(p)))
}

fn from_any_cell(document: &Html) -> Option<String> {
    document
        .select(&CELL)
        .find_map(|cell| first_number(&text_content(cell)))
}

fn from_labelled_text(document: &Html) -> Option<String> {
    let body = document.select(&BODY).next()?;
    let text = inner_text(body);
    let candidate = LABELLED.captures(&text)?.get(1)?.as_str().trim().to_string();
    first_number(&candidate).or_else(|| {
        accept(&candidate)?
            .split_whitespace()
            .next()
            .map(str::to_string)
    })
}

fn from_info_sections(document: &Html) -> Option<String> {
    document
        .select(&INFO_SECTIONS)
        .map(|section| section.text().collect::<String>())
        .filter(|text| text.contains(LABEL))
        .find_map(|text| first_number(&text))
}

fn first_number(text: &str) -> Option<String> {
    DOCUMENT_NUMBER.find(text).map(|m| m.as_str().to_string())
}

fn is_unnumbered_issuer(document: &Html) -> bool {
    document
        .select(&TITLE)
        .next()
        .map(|title| {
            let title = text_content(title);
            UNNUMBERED_ISSUERS.iter().any(|issuer| title.contains(issuer))
        })
        .unwrap_or(false)
}
