//! SerpApi Google Lens reverse-image search.

use std::time::Duration;

use async_trait::async_trait;
use pricelens_core::text::collapse_whitespace;
use pricelens_core::{CandidateKind, RawListing};
use reqwest::Client;
use serde::Deserialize;

use crate::error::VisionError;
use crate::provider::{LensResult, ProviderOutput, SignalProvider};

pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

const MAX_TITLES: usize = 5;
const MAX_LISTINGS: usize = 20;

#[derive(Debug, Deserialize)]
struct LensResponse {
    #[serde(default)]
    knowledge_graph: Vec<KnowledgeGraphEntry>,
    #[serde(default)]
    visual_matches: Vec<VisualMatch>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeGraphEntry {
    title: Option<String>,
    subtitle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisualMatch {
    title: Option<String>,
    link: Option<String>,
    source: Option<String>,
    thumbnail: Option<String>,
    price: Option<LensPrice>,
}

#[derive(Debug, Deserialize)]
struct LensPrice {
    extracted_value: Option<f64>,
    currency: Option<String>,
}

pub struct SerpApiLensClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SerpApiLensClient {
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, VisionError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn search_url(&self, image_url: &str) -> Result<reqwest::Url, VisionError> {
        let mut url = reqwest::Url::parse(&format!("{}/search.json", self.base_url)).map_err(
            |e| VisionError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
                reason: e.to_string(),
            },
        )?;
        url.query_pairs_mut()
            .append_pair("engine", "google_lens")
            .append_pair("url", image_url)
            .append_pair("hl", "ko")
            .append_pair("country", "kr")
            .append_pair("api_key", &self.api_key);
        Ok(url)
    }

    /// Reverse-image search for `image_url`.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError`] on transport, status, parse, or API-level failure.
    pub async fn lens_search(&self, image_url: &str) -> Result<LensResult, VisionError> {
        let url = self.search_url(image_url)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::UnexpectedStatus {
                status: status.as_u16(),
                url: format!("{}/search.json", self.base_url),
            });
        }

        let text = response.text().await?;
        let parsed: LensResponse =
            serde_json::from_str(&text).map_err(|e| VisionError::Deserialize {
                context: "google_lens response".to_string(),
                source: e,
            })?;

        if let Some(message) = parsed.error {
            return Err(VisionError::Api {
                provider: "serpapi_lens".to_string(),
                message,
            });
        }

        Ok(lens_result(parsed))
    }
}

/// Knowledge-graph entries describing a brand or company supply the brand;
/// the first remaining titled entry names the product.
fn lens_result(response: LensResponse) -> LensResult {
    let mut brand = None;
    let mut product_name = None;
    for entry in response.knowledge_graph {
        let Some(title) = entry
            .title
            .map(|t| collapse_whitespace(&t))
            .filter(|t| !t.is_empty())
        else {
            continue;
        };
        let subtitle = entry.subtitle.unwrap_or_default().to_lowercase();
        let describes_brand = subtitle.contains("brand") || subtitle.contains("company");
        if describes_brand && brand.is_none() {
            brand = Some(title);
        } else if !describes_brand && product_name.is_none() {
            product_name = Some(title);
        }
    }

    let titles = response
        .visual_matches
        .iter()
        .filter_map(|m| m.title.as_deref())
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .take(MAX_TITLES)
        .collect();

    let listings = response
        .visual_matches
        .into_iter()
        .filter_map(|m| {
            let link = m.link.filter(|l| !l.trim().is_empty())?;
            let title = collapse_whitespace(m.title.as_deref().unwrap_or_default());
            let (amount, currency) = m.price.map_or((0.0, String::new()), |p| {
                (
                    p.extracted_value
                        .filter(|v| v.is_finite() && *v > 0.0)
                        .unwrap_or(0.0),
                    p.currency.unwrap_or_default(),
                )
            });
            Some(RawListing {
                title,
                amount,
                currency,
                link,
                thumbnail: m.thumbnail,
                source: m.source.unwrap_or_else(|| "Google Lens".to_string()),
                kind: CandidateKind::VisualMatch,
            })
        })
        .take(MAX_LISTINGS)
        .collect();

    LensResult {
        product_name,
        brand,
        titles,
        listings,
    }
}

pub struct LensProvider {
    client: SerpApiLensClient,
}

impl LensProvider {
    #[must_use]
    pub fn new(client: SerpApiLensClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SignalProvider for LensProvider {
    fn name(&self) -> &'static str {
        "serpapi_lens"
    }

    async fn analyze(&self, image_url: &str) -> Result<ProviderOutput, VisionError> {
        self.client
            .lens_search(image_url)
            .await
            .map(ProviderOutput::Lens)
    }
}
