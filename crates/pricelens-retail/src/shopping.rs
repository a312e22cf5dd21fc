//! SerpApi Google Shopping structured adapter.

use async_trait::async_trait;
use pricelens_core::text::collapse_whitespace;
use pricelens_core::{CandidateKind, RawListing};
use reqwest::Client;
use serde::Deserialize;

use crate::adapter::{check_status, RetailerAdapter, RetrievalOutcome};
use crate::error::RetailError;

pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

const ADAPTER_NAME: &str = "google_shopping";
const MAX_RESULTS: usize = 20;

#[derive(Debug, Deserialize)]
struct ShoppingResponse {
    #[serde(default)]
    shopping_results: Vec<ShoppingResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShoppingResult {
    title: Option<String>,
    link: Option<String>,
    product_link: Option<String>,
    source: Option<String>,
    price: Option<String>,
    extracted_price: Option<f64>,
    thumbnail: Option<String>,
}

/// Currency marker of a display price such as `"₩129,000"` or `"US$35.00"`:
/// the price text with digits, separators and whitespace removed.
fn currency_marker(price: &str) -> String {
    price
        .chars()
        .filter(|c| !c.is_ascii_digit() && !matches!(c, '.' | ',') && !c.is_whitespace())
        .collect()
}

fn to_listing(result: ShoppingResult) -> Option<RawListing> {
    let link = result
        .link
        .or(result.product_link)
        .filter(|l| !l.trim().is_empty())?;
    let title = collapse_whitespace(result.title.as_deref().unwrap_or_default());
    if title.is_empty() {
        return None;
    }
    let amount = result
        .extracted_price
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0);
    let currency = result
        .price
        .as_deref()
        .map(currency_marker)
        .unwrap_or_default();
    Some(RawListing {
        title,
        amount,
        currency,
        link,
        thumbnail: result.thumbnail,
        source: result
            .source
            .unwrap_or_else(|| "Google Shopping".to_owned()),
        kind: CandidateKind::Listing,
    })
}

pub struct ShoppingAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ShoppingAdapter {
    #[must_use]
    pub fn new(client: Client, api_key: &str) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(client: Client, api_key: &str, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn search_url(&self, keyword: &str) -> Result<reqwest::Url, RetailError> {
        let mut url = reqwest::Url::parse(&format!("{}/search.json", self.base_url)).map_err(
            |e| RetailError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
                reason: e.to_string(),
            },
        )?;
        url.query_pairs_mut()
            .append_pair("engine", "google_shopping")
            .append_pair("q", keyword)
            .append_pair("gl", "kr")
            .append_pair("hl", "ko")
            .append_pair("api_key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl RetailerAdapter for ShoppingAdapter {
    fn name(&self) -> &'static str {
        ADAPTER_NAME
    }

    async fn search(&self, keyword: &str) -> RetrievalOutcome {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.search_url(keyword)?;
        let display_url = format!("{}/search.json", self.base_url);
        let response = self.client.get(url).send().await?;
        let response = check_status(ADAPTER_NAME, &display_url, response)?;

        let body = response.text().await?;
        let parsed: ShoppingResponse =
            serde_json::from_str(&body).map_err(|e| RetailError::Deserialize {
                context: format!("google_shopping results for \"{keyword}\""),
                source: e,
            })?;

        if let Some(message) = parsed.error {
            // SerpApi reports an empty result page as an error string.
            if message.contains("hasn't returned any results") {
                return Ok(Vec::new());
            }
            return Err(RetailError::Api {
                adapter: ADAPTER_NAME.to_owned(),
                message,
            });
        }

        Ok(parsed
            .shopping_results
            .into_iter()
            .filter_map(to_listing)
            .take(MAX_RESULTS)
            .collect())
    }
}
