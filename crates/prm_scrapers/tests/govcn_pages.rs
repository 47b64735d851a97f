use prm_scrapers::scrapers::china::govcn::{parse_detail, parse_listing};

const LISTING: &str = include_str!("fixtures/zuixin.htm");
const DESKTOP: &str = include_str!("fixtures/content_desktop.htm");
const MOBILE: &str = include_str!("fixtures/content_mobile.htm");

#[test]
fn test_listing_page() {
    let links = parse_listing(LISTING, "https://www.gov.cn/zhengce/zuixin.htm").unwrap();
    assert_eq!(links.len(), 3);

    assert_eq!(links[0].maintitle, "国务院关于加快构建新型电力系统的指导意见");
    assert_eq!(links[0].pub_url, "https://www.gov.cn/zhengce/content/202501/content_6998765.htm");
    assert_eq!(links[0].publish_date, "2025-01-16");

    assert_eq!(links[2].pub_url, "https://www.gov.cn/zhengce/zhengceku/202501/content_6998612.htm");
}

#[test]
fn test_desktop_detail_page() {
    let detail = parse_detail(DESKTOP, 10_000);
    assert_eq!(detail.fwzh.as_deref(), Some("国发〔2025〕3号"));
    assert_eq!(detail.title.as_deref(), Some("国务院关于加快构建新型电力系统的指导意见"));
    assert!(detail.content.starts_with("各省、自治区、直辖市人民政府"));
    assert!(detail.content.ends_with("一、总体要求"));
    assert!(!detail.content.contains('\n'));
}

#[test]
fn test_mobile_detail_page() {
    let detail = parse_detail(MOBILE, 10_000);
    assert_eq!(detail.fwzh.as_deref(), Some("国办发〔2025〕1号"));
    assert_eq!(
        detail.content,
        "各省、自治区、直辖市人民政府： 经国务院同意，现就优化营商环境有关事项通知如下。"
    );
}
