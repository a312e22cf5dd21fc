//! Scraping rules for the supported Korean retailers.
//!
//! Each retailer is described by data alone; [`crate::html::HtmlAdapter`]
//! interprets a profile. Selector lists are fallbacks tried in order.

/// One way to read a field out of a result row: the text of the first
/// element matching `css`, or the named attribute of that element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub css: &'static str,
    pub attr: Option<&'static str>,
}

const fn text(css: &'static str) -> FieldRule {
    FieldRule { css, attr: None }
}

const fn attr(css: &'static str, attr: &'static str) -> FieldRule {
    FieldRule {
        css,
        attr: Some(attr),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteProfile {
    /// Identifier used in logs.
    pub name: &'static str,
    /// Seller label used when the row carries none.
    pub display_name: &'static str,
    /// Scheme and host the search page is fetched from.
    pub origin: &'static str,
    /// Path and query of the search page; `{query}` is replaced by the
    /// percent-encoded keyword.
    pub search_path: &'static str,
    /// Base for resolving relative product links and thumbnails.
    pub link_base: &'static str,
    pub row_selectors: &'static [&'static str],
    pub title: &'static [FieldRule],
    pub link: &'static [FieldRule],
    pub price: &'static [FieldRule],
    pub thumbnail: &'static [FieldRule],
    pub seller: &'static [FieldRule],
    pub max_rows: usize,
    pub accepts_translated: bool,
}

impl SiteProfile {
    pub(crate) fn search_url(&self, origin: &str, encoded_query: &str) -> String {
        format!(
            "{}{}",
            origin.trim_end_matches('/'),
            self.search_path.replace("{query}", encoded_query)
        )
    }
}

pub const NAVER_SHOPPING: SiteProfile = SiteProfile {
    name: "naver_shopping",
    display_name: "네이버쇼핑",
    origin: "https://search.shopping.naver.com",
    search_path: "/search/all?query={query}&sort=price_asc",
    link_base: "https://search.shopping.naver.com",
    row_selectors: &[
        r#"div[class*="product_item"]"#,
        r#"li[class*="product_item"]"#,
        r#"div[class*="basicList_item"]"#,
    ],
    title: &[
        text(r#"[class*="product_title"]"#),
        text(r#"[class*="title"]"#),
        attr("a[title]", "title"),
    ],
    link: &[
        attr(r#"a[href*="shopping"]"#, "href"),
        attr(r#"a[href*="smartstore"]"#, "href"),
        attr("a[href]", "href"),
    ],
    price: &[text(r#"[class*="price_num"]"#), text(r#"[class*="price"]"#)],
    thumbnail: &[attr("img[src]", "src"), attr("img[data-src]", "data-src")],
    seller: &[text(r#"[class*="mall"]"#)],
    max_rows: 12,
    accepts_translated: true,
};

pub const DANAWA: SiteProfile = SiteProfile {
    name: "danawa",
    display_name: "다나와",
    origin: "https://search.danawa.com",
    search_path: "/dsearch.php?query={query}&tab=main&sort=lowprice",
    link_base: "https://search.danawa.com",
    row_selectors: &["li.prod_item", "div.prod_item"],
    title: &[text(".prod_name a"), text(r#"[class*="prod_name"]"#)],
    link: &[attr(".prod_name a", "href"), attr("a[href]", "href")],
    price: &[text(".price_sect strong"), text(r#"[class*="price"] strong"#)],
    thumbnail: &[attr(".thumb_image img", "src"), attr("img[src]", "src")],
    seller: &[],
    max_rows: 8,
    accepts_translated: true,
};

pub const ELEVEN_ST: SiteProfile = SiteProfile {
    name: "11st",
    display_name: "11번가",
    origin: "https://search.11st.co.kr",
    search_path: "/Search.tmall?kwd={query}&sortCd=LWPR",
    link_base: "https://www.11st.co.kr",
    row_selectors: &["li.c_item", "div.c_item", "li[data-log-body]"],
    title: &[text(".c_tit a"), text(r#"[class*="title"]"#)],
    link: &[attr(".c_tit a", "href"), attr("a[href]", "href")],
    price: &[text(".c_prc strong"), text(r#"[class*="price"] strong"#)],
    thumbnail: &[attr(".c_prd_img img", "src"), attr("img[src]", "src")],
    seller: &[],
    max_rows: 8,
    accepts_translated: false,
};

pub const GMARKET: SiteProfile = SiteProfile {
    name: "gmarket",
    display_name: "G마켓",
    origin: "https://browse.gmarket.co.kr",
    search_path: "/search?keyword={query}&s=8",
    link_base: "https://browse.gmarket.co.kr",
    row_selectors: &[r#"[class*="box__item-container"]"#, "li.item__content"],
    title: &[text(r#"[class*="text__item-title"]"#), text(".item_tit")],
    link: &[attr("a[href]", "href")],
    price: &[text(r#"[class*="text__value"]"#), text(r#"[class*="price"]"#)],
    thumbnail: &[attr("img[src]", "src"), attr("img[data-src]", "data-src")],
    seller: &[],
    max_rows: 8,
    accepts_translated: false,
};

pub const SSG: SiteProfile = SiteProfile {
    name: "ssg",
    display_name: "SSG",
    origin: "https://www.ssg.com",
    search_path: "/search.ssg?target=all&query={query}&sort=price_asc",
    link_base: "https://www.ssg.com",
    row_selectors: &["li.cunit_t232", r#"li[class*="cunit"]"#],
    title: &[text(".cunit_info .title"), text(r#"[class*="title"]"#)],
    link: &[attr("a[href]", "href")],
    price: &[text(".opt_price .ssg_price"), text(r#"[class*="price"]"#)],
    thumbnail: &[attr(".cunit_img img", "src"), attr("img[src]", "src")],
    seller: &[],
    max_rows: 8,
    accepts_translated: false,
};

pub const AUCTION: SiteProfile = SiteProfile {
    name: "auction",
    display_name: "옥션",
    origin: "https://browse.auction.co.kr",
    search_path: "/search?keyword={query}&s=8",
    link_base: "https://browse.auction.co.kr",
    row_selectors: &[r#"[class*="box__item-container"]"#, "li.item__content"],
    title: &[text(r#"[class*="text__item-title"]"#), text(".item_tit")],
    link: &[attr("a[href]", "href")],
    price: &[text(r#"[class*="text__value"]"#), text(r#"[class*="price"]"#)],
    thumbnail: &[attr("img[src]", "src")],
    seller: &[],
    max_rows: 8,
    accepts_translated: false,
};

/// Every built-in retailer, in fan-out order.
pub const ALL_SITES: [SiteProfile; 6] = [NAVER_SHOPPING, DANAWA, ELEVEN_ST, GMARKET, SSG, AUCTION];
