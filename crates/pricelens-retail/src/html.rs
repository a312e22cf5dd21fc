//! Generic HTML scraping adapter driven by a [`SiteProfile`].

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use pricelens_core::text::{collapse_whitespace, truncate_chars};
use pricelens_core::{CandidateKind, RawListing};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::adapter::{check_status, RetailerAdapter, RetrievalOutcome};
use crate::error::RetailError;
use crate::price::{absolutize, parse_price_text};
use crate::sites::{FieldRule, SiteProfile};

const MAX_TITLE_CHARS: usize = 100;
const MIN_TITLE_CHARS: usize = 3;
const SCRAPED_CURRENCY: &str = "KRW";
/// Keywords with at least this many words get one retry with the last word dropped.
const SHORTEN_MIN_WORDS: usize = 3;

struct CompiledRule {
    selector: Selector,
    attr: Option<&'static str>,
}

struct CompiledProfile {
    rows: Vec<Selector>,
    title: Vec<CompiledRule>,
    link: Vec<CompiledRule>,
    price: Vec<CompiledRule>,
    thumbnail: Vec<CompiledRule>,
    seller: Vec<CompiledRule>,
}

fn compile_selector(css: &str) -> Result<Selector, RetailError> {
    Selector::parse(css).map_err(|e| RetailError::Selector {
        selector: css.to_owned(),
        reason: e.to_string(),
    })
}

fn compile_rules(rules: &[FieldRule]) -> Result<Vec<CompiledRule>, RetailError> {
    rules
        .iter()
        .map(|rule| {
            Ok(CompiledRule {
                selector: compile_selector(rule.css)?,
                attr: rule.attr,
            })
        })
        .collect()
}

impl CompiledProfile {
    fn compile(profile: &SiteProfile) -> Result<Self, RetailError> {
        Ok(Self {
            rows: profile
                .row_selectors
                .iter()
                .map(|css| compile_selector(css))
                .collect::<Result<_, _>>()?,
            title: compile_rules(profile.title)?,
            link: compile_rules(profile.link)?,
            price: compile_rules(profile.price)?,
            thumbnail: compile_rules(profile.thumbnail)?,
            seller: compile_rules(profile.seller)?,
        })
    }
}

/// First non-blank value produced by `rules`, tried in order.
fn first_value(row: ElementRef<'_>, rules: &[CompiledRule]) -> Option<String> {
    rules.iter().find_map(|rule| {
        let element = row.select(&rule.selector).next()?;
        let value = match rule.attr {
            Some(name) => element.value().attr(name).unwrap_or_default().to_owned(),
            None => element.text().collect::<String>(),
        };
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_owned())
    })
}

/// Scrapes one retailer's search page.
pub struct HtmlAdapter {
    client: Client,
    profile: SiteProfile,
    origin: String,
    compiled: CompiledProfile,
}

impl HtmlAdapter {
    /// # Errors
    ///
    /// Returns [`RetailError::Selector`] if any selector in `profile` fails to parse.
    pub fn new(client: Client, profile: SiteProfile) -> Result<Self, RetailError> {
        Self::with_origin(client, profile, profile.origin)
    }

    /// Fetches search pages from `origin` instead of the profile's own host.
    /// Links are still resolved against the profile's `link_base`.
    ///
    /// # Errors
    ///
    /// Returns [`RetailError::Selector`] if any selector in `profile` fails to parse.
    pub fn with_origin(
        client: Client,
        profile: SiteProfile,
        origin: &str,
    ) -> Result<Self, RetailError> {
        Ok(Self {
            client,
            compiled: CompiledProfile::compile(&profile)?,
            profile,
            origin: origin.trim_end_matches('/').to_owned(),
        })
    }

    #[must_use]
    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    async fn fetch_page(&self, keyword: &str) -> Result<String, RetailError> {
        let encoded = utf8_percent_encode(keyword, NON_ALPHANUMERIC).to_string();
        let url = self.profile.search_url(&self.origin, &encoded);
        let response = self.client.get(&url).send().await?;
        let response = check_status(self.profile.name, &url, response)?;
        Ok(response.text().await?)
    }

    async fn search_once(&self, keyword: &str) -> RetrievalOutcome {
        let body = self.fetch_page(keyword).await?;
        let rows = self.parse_rows(&body);
        tracing::debug!(
            adapter = self.profile.name,
            keyword,
            rows = rows.len(),
            "scraped search page"
        );
        Ok(rows)
    }

    /// Extracts listings from a search page.
    ///
    /// Row selectors are tried in order and the first one yielding at least
    /// one usable row wins. A row is usable when it has a title longer than
    /// two characters and a link that resolves to http(s).
    #[must_use]
    pub fn parse_rows(&self, html: &str) -> Vec<RawListing> {
        let document = Html::parse_document(html);
        for row_selector in &self.compiled.rows {
            let rows: Vec<RawListing> = document
                .select(row_selector)
                .take(self.profile.max_rows)
                .filter_map(|row| self.parse_row(row))
                .collect();
            if !rows.is_empty() {
                return rows;
            }
        }
        Vec::new()
    }

    fn parse_row(&self, row: ElementRef<'_>) -> Option<RawListing> {
        let title = first_value(row, &self.compiled.title)
            .map(|t| truncate_chars(&collapse_whitespace(&t), MAX_TITLE_CHARS))?;
        if title.chars().count() < MIN_TITLE_CHARS {
            return None;
        }

        let href = first_value(row, &self.compiled.link)?;
        let link = absolutize(self.profile.link_base, &href)?;

        let amount = first_value(row, &self.compiled.price).map_or(0.0, |p| parse_price_text(&p));
        let thumbnail = first_value(row, &self.compiled.thumbnail)
            .and_then(|src| absolutize(self.profile.link_base, &src));
        let source = first_value(row, &self.compiled.seller)
            .map(|s| collapse_whitespace(&s))
            .unwrap_or_else(|| self.profile.display_name.to_owned());

        Some(RawListing {
            title,
            amount,
            currency: SCRAPED_CURRENCY.to_owned(),
            link,
            thumbnail,
            source,
            kind: CandidateKind::Listing,
        })
    }
}

/// The keyword without its last word, when it is long enough to shorten.
fn shortened(keyword: &str) -> Option<String> {
    let words: Vec<&str> = keyword.split_whitespace().collect();
    (words.len() >= SHORTEN_MIN_WORDS).then(|| words[..words.len() - 1].join(" "))
}

#[async_trait]
impl RetailerAdapter for HtmlAdapter {
    fn name(&self) -> &'static str {
        self.profile.name
    }

    fn accepts_translated(&self) -> bool {
        self.profile.accepts_translated
    }

    async fn search(&self, keyword: &str) -> RetrievalOutcome {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.search_once(keyword).await?;
        if !rows.is_empty() {
            return Ok(rows);
        }

        match shortened(keyword) {
            Some(shorter) => {
                tracing::debug!(
                    adapter = self.profile.name,
                    keyword,
                    retry = %shorter,
                    "no rows, retrying with shorter keyword"
                );
                self.search_once(&shorter).await
            }
            None => Ok(rows),
        }
    }
}

#[cfg(test)]
#[path = "html_test.rs"]
mod tests;
