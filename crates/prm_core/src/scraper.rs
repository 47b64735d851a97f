use async_trait::async_trait;

use crate::types::{ArticleRecord, DiscoveredLink};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub emoji: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    pub name: &'static str,
    pub region: Region,
}

/// A press-release source that can be walked in two passes: listing pages
/// first, then each article's detail page.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Returns the metadata of the source
    fn source_metadata(&self) -> SourceMetadata;

    /// Short label of the extraction mechanism, reported in job results
    fn method(&self) -> &str;

    /// Returns true if this scraper can handle the given URL
    fn can_handle(&self, url: &str) -> bool;

    /// URL of the given 1-based listing page
    fn listing_url(&self, page: usize) -> String;

    /// Fetch one listing page and return the articles linked from it
    async fn discover(&self, page: usize) -> Result<Vec<DiscoveredLink>>;

    /// Visit an article and fill in its document number and content
    async fn extract(&self, link: &DiscoveredLink) -> Result<ArticleRecord>;
}
