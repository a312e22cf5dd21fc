//! Google Cloud Vision `images:annotate` client.
//!
//! One [`GoogleVisionClient`] is shared by four [`GoogleVisionProvider`]s,
//! each asking for a single feature so that a failure in one detection type
//! never hides the others.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pricelens_core::Entity;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::VisionError;
use crate::provider::{ProviderOutput, SignalProvider};

pub const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com";

/// Labels at or below this score are too generic to be useful.
const LABEL_MIN_SCORE: f32 = 0.7;
const LOGO_MIN_SCORE: f32 = 0.5;
const WEB_MAX_RESULTS: u32 = 20;
const LABEL_MAX_RESULTS: u32 = 10;
const LOGO_MAX_RESULTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionFeature {
    WebDetection,
    LabelDetection,
    LogoDetection,
    TextDetection,
}

impl VisionFeature {
    pub const ALL: [VisionFeature; 4] = [
        VisionFeature::WebDetection,
        VisionFeature::LabelDetection,
        VisionFeature::LogoDetection,
        VisionFeature::TextDetection,
    ];

    fn api_name(self) -> &'static str {
        match self {
            VisionFeature::WebDetection => "WEB_DETECTION",
            VisionFeature::LabelDetection => "LABEL_DETECTION",
            VisionFeature::LogoDetection => "LOGO_DETECTION",
            VisionFeature::TextDetection => "TEXT_DETECTION",
        }
    }

    fn max_results(self) -> Option<u32> {
        match self {
            VisionFeature::WebDetection => Some(WEB_MAX_RESULTS),
            VisionFeature::LabelDetection => Some(LABEL_MAX_RESULTS),
            VisionFeature::LogoDetection => Some(LOGO_MAX_RESULTS),
            VisionFeature::TextDetection => None,
        }
    }

    fn provider_name(self) -> &'static str {
        match self {
            VisionFeature::WebDetection => "vision_web",
            VisionFeature::LabelDetection => "vision_labels",
            VisionFeature::LogoDetection => "vision_logos",
            VisionFeature::TextDetection => "vision_text",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    web_detection: Option<WebDetection>,
    #[serde(default)]
    label_annotations: Vec<Annotation>,
    #[serde(default)]
    logo_annotations: Vec<Annotation>,
    #[serde(default)]
    text_annotations: Vec<Annotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebDetection {
    #[serde(default)]
    web_entities: Vec<WebEntity>,
    #[serde(default)]
    best_guess_labels: Vec<BestGuessLabel>,
}

#[derive(Debug, Deserialize)]
struct WebEntity {
    description: Option<String>,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct BestGuessLabel {
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    #[serde(default)]
    description: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

/// Thin REST client for `POST /v1/images:annotate` authenticated by API key.
pub struct GoogleVisionClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleVisionClient {
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, VisionError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Same as [`GoogleVisionClient::new`] but against another host (tests, proxies).
    ///
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
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn annotate_url(&self) -> Result<reqwest::Url, VisionError> {
        let mut url = reqwest::Url::parse(&format!("{}/v1/images:annotate", self.base_url))
            .map_err(|e| VisionError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn annotate(
        &self,
        image_url: &str,
        feature: VisionFeature,
    ) -> Result<AnnotateImageResponse, VisionError> {
        let url = self.annotate_url()?;

        let mut feature_body = json!({ "type": feature.api_name() });
        if let Some(max) = feature.max_results() {
            feature_body["maxResults"] = json!(max);
        }
        let body = json!({
            "requests": [{
                "image": { "source": { "imageUri": image_url } },
                "features": [feature_body],
            }]
        });

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::UnexpectedStatus {
                status: status.as_u16(),
                url: format!("{}/v1/images:annotate", self.base_url),
            });
        }

        let text = response.text().await?;
        let parsed: AnnotateResponse =
            serde_json::from_str(&text).map_err(|e| VisionError::Deserialize {
                context: format!("{} annotate response", feature.api_name()),
                source: e,
            })?;

        let image_response = parsed.responses.into_iter().next().unwrap_or_default();
        if let Some(err) = &image_response.error {
            return Err(VisionError::Api {
                provider: feature.provider_name().to_string(),
                message: err.message.clone(),
            });
        }
        Ok(image_response)
    }

    /// Run one feature and map it to a [`ProviderOutput`].
    ///
    /// # Errors
    ///
    /// Returns [`VisionError`] on transport, status, parse, or API-level failure.
    pub async fn detect(
        &self,
        image_url: &str,
        feature: VisionFeature,
    ) -> Result<ProviderOutput, VisionError> {
        let response = self.annotate(image_url, feature).await?;
        let output = match feature {
            VisionFeature::WebDetection => web_output(response.web_detection.unwrap_or_default()),
            VisionFeature::LabelDetection => ProviderOutput::Labels(descriptions_above(
                response.label_annotations,
                LABEL_MIN_SCORE,
            )),
            VisionFeature::LogoDetection => ProviderOutput::Logos(descriptions_above(
                response.logo_annotations,
                LOGO_MIN_SCORE,
            )),
            VisionFeature::TextDetection => text_output(response.text_annotations),
        };
        Ok(output)
    }
}

fn web_output(web: WebDetection) -> ProviderOutput {
    let best_guess_label = web
        .best_guess_labels
        .into_iter()
        .filter_map(|l| l.label)
        .map(|l| l.trim().to_string())
        .find(|l| !l.is_empty());

    // Web entity scores are relevancy values that can exceed 1.0.
    let entities = web
        .web_entities
        .into_iter()
        .filter_map(|e| {
            let text = e.description?.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(Entity {
                text,
                confidence: e.score.clamp(0.0, 1.0),
            })
        })
        .collect();

    ProviderOutput::Web {
        best_guess_label,
        entities,
    }
}

fn descriptions_above(annotations: Vec<Annotation>, min_score: f32) -> Vec<String> {
    annotations
        .into_iter()
        .filter(|a| a.score > min_score)
        .map(|a| a.description.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

/// The first text annotation is the whole detected text block; the rest are
/// individual tokens.
fn text_output(annotations: Vec<Annotation>) -> ProviderOutput {
    let mut iter = annotations.into_iter();
    let full_text = iter
        .next()
        .map(|a| a.description.trim().to_string())
        .unwrap_or_default();
    let tokens = iter
        .map(|a| a.description.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    ProviderOutput::Text { tokens, full_text }
}

/// A [`SignalProvider`] bound to one Vision feature.
pub struct GoogleVisionProvider {
    client: Arc<GoogleVisionClient>,
    feature: VisionFeature,
}

impl GoogleVisionProvider {
    #[must_use]
    pub fn new(client: Arc<GoogleVisionClient>, feature: VisionFeature) -> Self {
        Self { client, feature }
    }

    /// One provider per Vision feature, all sharing `client`.
    #[must_use]
    pub fn all(client: &Arc<GoogleVisionClient>) -> Vec<Self> {
        VisionFeature::ALL
            .into_iter()
            .map(|feature| Self::new(Arc::clone(client), feature))
            .collect()
    }
}

#[async_trait]
impl SignalProvider for GoogleVisionProvider {
    fn name(&self) -> &'static str {
        self.feature.provider_name()
    }

    async fn analyze(&self, image_url: &str) -> Result<ProviderOutput, VisionError> {
        self.client.detect(image_url, self.feature).await
    }
}
