//! The end-to-end search pipeline.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use pricelens_core::text::collapse_whitespace;
use pricelens_core::{AppConfig, CandidateKind, ImageSignals, Lexicon, RawListing};
use pricelens_retail::{
    build_http_client, retrieve, FanoutLimits, HtmlAdapter, RetailerAdapter, ShoppingAdapter,
    ALL_SITES,
};
use pricelens_vision::{
    collect_signals, fuse, lens_listings, GoogleVisionClient, GoogleVisionProvider, LensProvider,
    SerpApiLensClient, SignalProvider,
};

use crate::clean::TextCleaner;
use crate::error::PipelineError;
use crate::keywords::{Detection, KeywordEngine, SearchKeywordSet};
use crate::rank::{is_http_url, rank, rank_all};
use crate::response::{format_elapsed, results_message, KeywordSearchResponse, SearchResponse};
use crate::session::SearchSession;

/// Tunables of one pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_keywords: usize,
    pub fanout: FanoutLimits,
    /// Deadline for each signal provider call.
    pub provider_timeout: Duration,
    pub max_results: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_keywords: 8,
            fanout: FanoutLimits::default(),
            provider_timeout: Duration::from_secs(10),
            max_results: 50,
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Self {
            max_keywords: config.max_keywords,
            fanout: FanoutLimits {
                keywords: config.fanout_keywords,
                translated_keywords: config.fanout_translated_keywords,
                max_concurrent: config.max_concurrent_calls,
                call_timeout: timeout,
            },
            provider_timeout: timeout,
            max_results: config.max_results,
        }
    }
}

/// Image URL in, ranked listings out.
///
/// Providers and adapters are injected so tests can substitute fakes; the
/// lexicon is shared read-only across requests.
pub struct SearchPipeline {
    providers: Vec<Arc<dyn SignalProvider>>,
    adapters: Vec<Arc<dyn RetailerAdapter>>,
    lexicon: Arc<Lexicon>,
    cleaner: TextCleaner,
    settings: PipelineSettings,
}

impl SearchPipeline {
    /// # Errors
    ///
    /// Returns [`PipelineError::NoisePattern`] if the lexicon's noise words do
    /// not compile into a pattern.
    pub fn new(
        providers: Vec<Arc<dyn SignalProvider>>,
        adapters: Vec<Arc<dyn RetailerAdapter>>,
        lexicon: Arc<Lexicon>,
        settings: PipelineSettings,
    ) -> Result<Self, PipelineError> {
        let cleaner = TextCleaner::new(&lexicon)?;
        Ok(Self {
            providers,
            adapters,
            lexicon,
            cleaner,
            settings,
        })
    }

    /// Wires the production providers and adapters from configuration.
    ///
    /// Vision providers exist only with a Google Vision key; the Lens provider
    /// and the Shopping adapter only with a SerpApi key. The scraping
    /// adapters are always present.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the lexicon cannot be loaded or an HTTP
    /// client or selector fails to build.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let lexicon = Lexicon::load_or_builtin(config.lexicon_path.as_deref())?;
        let timeout_secs = config.request_timeout_secs;

        let mut providers: Vec<Arc<dyn SignalProvider>> = Vec::new();
        if let Some(key) = config.google_vision_api_key.as_deref() {
            let client = Arc::new(GoogleVisionClient::new(key, timeout_secs)?);
            for provider in GoogleVisionProvider::all(&client) {
                providers.push(Arc::new(provider));
            }
        } else {
            tracing::warn!(
                "GOOGLE_VISION_API_KEY not set; image analysis providers disabled"
            );
        }

        let http = build_http_client(timeout_secs, &config.user_agent)?;
        let mut adapters: Vec<Arc<dyn RetailerAdapter>> = Vec::new();
        for profile in ALL_SITES {
            adapters.push(Arc::new(HtmlAdapter::new(http.clone(), profile)?));
        }

        if let Some(key) = config.serpapi_api_key.as_deref() {
            providers.push(Arc::new(LensProvider::new(SerpApiLensClient::new(
                key,
                timeout_secs,
            )?)));
            adapters.push(Arc::new(ShoppingAdapter::new(http, key)));
        } else {
            tracing::warn!(
                "SERPAPI_API_KEY not set; reverse image search and Google Shopping disabled"
            );
        }

        tracing::info!(
            providers = providers.len(),
            adapters = adapters.len(),
            "search pipeline ready"
        );
        Self::new(
            providers,
            adapters,
            Arc::new(lexicon),
            PipelineSettings::from_app_config(config),
        )
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    #[must_use]
    pub fn adapter_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    fn engine(&self) -> KeywordEngine<'_> {
        KeywordEngine::new(&self.lexicon, &self.cleaner, self.settings.max_keywords)
    }

    /// Detection and keyword synthesis over already-fused signals, without
    /// any network call.
    #[must_use]
    pub fn synthesize_keywords(&self, signals: &ImageSignals) -> (Detection, SearchKeywordSet) {
        let detection = Detection::from_signals(signals, &self.lexicon);
        let keywords = self.engine().synthesize(signals, &detection);
        (detection, keywords)
    }

    /// Strips marketplace noise from retailer titles. Look-alike titles and
    /// titles that would clean down to nothing are left alone.
    fn tidy_titles(&self, listings: Vec<RawListing>) -> Vec<RawListing> {
        listings
            .into_iter()
            .map(|mut row| {
                if row.kind == CandidateKind::Listing {
                    if let Some(cleaned) = self.cleaner.clean(&row.title) {
                        row.title = cleaned;
                    }
                }
                row
            })
            .collect()
    }

    /// Runs the full pipeline for one image.
    ///
    /// An unrecognized image is a normal outcome (`success: false`, no
    /// retailer calls), not an error.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidInput`] when `image_url` is not an absolute
    /// http(s) URL, [`PipelineError::Panicked`] when a stage panics.
    pub async fn search_image(&self, image_url: &str) -> Result<SearchResponse, PipelineError> {
        let image_url = image_url.trim();
        if !is_http_url(image_url) {
            return Err(PipelineError::InvalidInput(
                "imageUrl must be an absolute http(s) URL".to_owned(),
            ));
        }
        AssertUnwindSafe(self.run_image(image_url))
            .catch_unwind()
            .await
            .map_err(|payload| PipelineError::Panicked(panic_message(payload.as_ref())))?
    }

    async fn run_image(&self, image_url: &str) -> Result<SearchResponse, PipelineError> {
        let mut session = SearchSession::start(image_url);

        let outputs =
            collect_signals(&self.providers, image_url, self.settings.provider_timeout).await;
        let signals = fuse(&outputs);
        let visual_listings = lens_listings(&outputs);
        let detection = Detection::from_signals(&signals, &self.lexicon);
        tracing::info!(
            providers = outputs.len(),
            labels = signals.labels.len(),
            logos = signals.logos.len(),
            brand = detection.brand.as_deref().unwrap_or(""),
            "signals extracted"
        );
        session.signals_extracted(signals, detection, visual_listings)?;

        let keywords = self
            .engine()
            .synthesize(session.signals(), session.detection());
        session.keywords_synthesized(keywords)?;

        if session.keywords().is_unrecognized() {
            let visual = rank(
                session.take_visual_listings(),
                &self.lexicon,
                self.settings.max_results,
            );
            tracing::info!(image_url, "no keywords synthesized; product not recognized");
            return session.finish_unrecognized(visual);
        }

        let listings = {
            let set = session.keywords();
            retrieve(
                &self.adapters,
                &set.keywords,
                &set.translated_keywords,
                &self.settings.fanout,
            )
            .await
        };
        session.results_retrieved(self.tidy_titles(listings))?;

        let ranked = rank_all(session.take_candidate_pool(), &self.lexicon);
        session.ranked(ranked)?;

        let response = session.finish(self.settings.max_results)?;
        tracing::info!(
            keyword = %response.search_keyword,
            results = response.count,
            visual_matches = response.visual_matches.len(),
            processing_time = %response.processing_time,
            "image search complete"
        );
        Ok(response)
    }

    /// Searches retailers for a user-supplied keyword and its translation.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidInput`] for a blank keyword,
    /// [`PipelineError::Panicked`] when a stage panics.
    pub async fn search_keyword(
        &self,
        keyword: &str,
    ) -> Result<KeywordSearchResponse, PipelineError> {
        let keyword = collapse_whitespace(keyword);
        if keyword.is_empty() {
            return Err(PipelineError::InvalidInput("keyword is required".into()));
        }
        AssertUnwindSafe(self.run_keyword(keyword))
            .catch_unwind()
            .await
            .map_err(|payload| PipelineError::Panicked(panic_message(payload.as_ref())))
    }

    async fn run_keyword(&self, keyword: String) -> KeywordSearchResponse {
        let started = Instant::now();
        let search_keyword = keyword.clone();
        let keywords = vec![keyword];
        let translated = self.engine().translate(&keywords);

        let listings = retrieve(
            &self.adapters,
            &keywords,
            &translated,
            &self.settings.fanout,
        )
        .await;
        let results = rank(
            self.tidy_titles(listings),
            &self.lexicon,
            self.settings.max_results,
        );
        let lowest_price = results.iter().find(|c| c.is_priced()).cloned();

        let mut search_keywords = keywords;
        search_keywords.extend(translated);

        let response = KeywordSearchResponse {
            success: true,
            message: results_message(results.len(), &search_keyword),
            search_keyword,
            search_keywords,
            count: results.len(),
            results,
            lowest_price,
            processing_time: format_elapsed(started.elapsed().as_millis()),
        };
        tracing::info!(
            keyword = %response.search_keyword,
            results = response.count,
            processing_time = %response.processing_time,
            "keyword search complete"
        );
        response
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
