use prm_core::Region;

pub mod document_number;
pub mod govcn;

pub use document_number::extract_document_number;
pub use govcn::GovCnScraper;

pub const REGION: Region = Region {
    name: "China",
    emoji: "🇨🇳",
};

const LISTING_BASE: &str = "https://www.gov.cn/zhengce/zuixin";

/// gov.cn "latest policies" listing: page 1 has no suffix, page n is `_n`.
pub fn listing_url(page: usize) -> String {
    if page <= 1 {
        format!("{}.htm", LISTING_BASE)
    } else {
        format!("{}_{}.htm", LISTING_BASE, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_urls() {
        assert_eq!(listing_url(1), "https://www.gov.cn/zhengce/zuixin.htm");
        assert_eq!(listing_url(2), "https://www.gov.cn/zhengce/zuixin_2.htm");
        assert_eq!(listing_url(10), "https://www.gov.cn/zhengce/zuixin_10.htm");
    }
}
