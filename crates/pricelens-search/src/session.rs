//! Per-request search state.
//!
//! A [`SearchSession`] walks through the pipeline stages in a fixed order and
//! refuses out-of-order transitions. The only shortcut is from
//! `KeywordsSynthesized` straight to `Responded` when no keyword was built.

use std::time::Instant;

use pricelens_core::{ImageSignals, ProductCandidate, RawListing, ENTITY_CONFIDENCE_THRESHOLD};

use crate::error::PipelineError;
use crate::keywords::{Detection, SearchKeywordSet};
use crate::response::{
    format_elapsed, results_message, Partition, SearchResponse, UNRECOGNIZED_MESSAGE,
};

const DETECTED_LABELS_LIMIT: usize = 5;
const DETECTED_ENTITIES_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ImageAcquired,
    SignalsExtracted,
    KeywordsSynthesized,
    ResultsRetrieved,
    Ranked,
    Responded,
}

#[derive(Debug)]
pub struct SearchSession {
    image_url: String,
    started: Instant,
    stage: Stage,
    signals: ImageSignals,
    detection: Detection,
    visual_listings: Vec<RawListing>,
    keywords: SearchKeywordSet,
    retrieved: Vec<RawListing>,
    ranked: Vec<ProductCandidate>,
}

impl SearchSession {
    #[must_use]
    pub fn start(image_url: &str) -> Self {
        Self {
            image_url: image_url.to_owned(),
            started: Instant::now(),
            stage: Stage::ImageAcquired,
            signals: ImageSignals::default(),
            detection: Detection::default(),
            visual_listings: Vec::new(),
            keywords: SearchKeywordSet::default(),
            retrieved: Vec::new(),
            ranked: Vec::new(),
        }
    }

    fn advance(&mut self, expected: Stage, to: Stage) -> Result<(), PipelineError> {
        if self.stage != expected {
            return Err(PipelineError::InvalidTransition {
                from: self.stage,
                to,
            });
        }
        tracing::debug!(
            from = ?self.stage,
            to = ?to,
            elapsed_ms = self.elapsed_ms(),
            "search stage"
        );
        self.stage = to;
        Ok(())
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    #[must_use]
    pub fn signals(&self) -> &ImageSignals {
        &self.signals
    }

    #[must_use]
    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    #[must_use]
    pub fn keywords(&self) -> &SearchKeywordSet {
        &self.keywords
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Records fused signals and the reverse-search listings that join the
    /// candidate pool regardless of keyword search.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidTransition`] unless the session was just started.
    pub fn signals_extracted(
        &mut self,
        signals: ImageSignals,
        detection: Detection,
        visual_listings: Vec<RawListing>,
    ) -> Result<(), PipelineError> {
        self.advance(Stage::ImageAcquired, Stage::SignalsExtracted)?;
        self.signals = signals;
        self.detection = detection;
        self.visual_listings = visual_listings;
        Ok(())
    }

    /// # Errors
    ///
    /// [`PipelineError::InvalidTransition`] unless signals were recorded.
    pub fn keywords_synthesized(
        &mut self,
        keywords: SearchKeywordSet,
    ) -> Result<(), PipelineError> {
        self.advance(Stage::SignalsExtracted, Stage::KeywordsSynthesized)?;
        self.keywords = keywords;
        Ok(())
    }

    /// # Errors
    ///
    /// [`PipelineError::InvalidTransition`] unless keywords were synthesized.
    pub fn results_retrieved(&mut self, listings: Vec<RawListing>) -> Result<(), PipelineError> {
        self.advance(Stage::KeywordsSynthesized, Stage::ResultsRetrieved)?;
        self.retrieved = listings;
        Ok(())
    }

    /// Every raw row gathered so far: retailer results, then reverse-search
    /// listings.
    pub fn take_candidate_pool(&mut self) -> Vec<RawListing> {
        let mut pool = std::mem::take(&mut self.retrieved);
        pool.append(&mut self.visual_listings);
        pool
    }

    /// # Errors
    ///
    /// [`PipelineError::InvalidTransition`] unless results were retrieved.
    pub fn ranked(&mut self, ranked: Vec<ProductCandidate>) -> Result<(), PipelineError> {
        self.advance(Stage::ResultsRetrieved, Stage::Ranked)?;
        self.ranked = ranked;
        Ok(())
    }

    /// Builds the response for a recognized product, keeping at most
    /// `max_results` entries in each of `results` and `visualMatches`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidTransition`] unless candidates were ranked.
    pub fn finish(mut self, max_results: usize) -> Result<SearchResponse, PipelineError> {
        self.advance(Stage::Ranked, Stage::Responded)?;
        let partition = Partition::split(std::mem::take(&mut self.ranked)).capped(max_results);
        let primary = self.keywords.primary().unwrap_or_default().to_owned();
        let message = results_message(partition.results.len(), &primary);
        Ok(self.into_response(true, message, primary, partition))
    }

    /// Builds the "not recognized" response directly after keyword synthesis.
    /// `visual_matches` are the ranked reverse-search listings.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidTransition`] unless keywords were synthesized
    /// and came out empty.
    pub fn finish_unrecognized(
        mut self,
        visual_matches: Vec<ProductCandidate>,
    ) -> Result<SearchResponse, PipelineError> {
        if !self.keywords.is_unrecognized() {
            return Err(PipelineError::InvalidTransition {
                from: self.stage,
                to: Stage::Responded,
            });
        }
        self.advance(Stage::KeywordsSynthesized, Stage::Responded)?;
        let partition = Partition {
            results: Vec::new(),
            visual_matches,
        };
        Ok(self.into_response(
            false,
            UNRECOGNIZED_MESSAGE.to_owned(),
            String::new(),
            partition,
        ))
    }

    /// Takes the reverse-search listings for the unrecognized path.
    pub fn take_visual_listings(&mut self) -> Vec<RawListing> {
        std::mem::take(&mut self.visual_listings)
    }

    fn into_response(
        self,
        success: bool,
        message: String,
        search_keyword: String,
        partition: Partition,
    ) -> SearchResponse {
        let lowest_price = partition.lowest_price();
        let detected_labels = self
            .signals
            .labels
            .iter()
            .take(DETECTED_LABELS_LIMIT)
            .cloned()
            .collect();
        let detected_entities = self
            .signals
            .confident_entities(ENTITY_CONFIDENCE_THRESHOLD)
            .take(DETECTED_ENTITIES_LIMIT)
            .map(|e| e.text.clone())
            .collect();
        let processing_time = format_elapsed(self.elapsed_ms());
        SearchResponse {
            success,
            message,
            search_image: self.image_url,
            search_keyword,
            search_keywords: self.keywords.keywords,
            translated_keywords: self.keywords.translated_keywords,
            detected_brand: self.detection.brand,
            detected_labels,
            detected_entities,
            count: partition.results.len(),
            results: partition.results,
            visual_matches: partition.visual_matches,
            lowest_price,
            processing_time,
        }
    }
}
