//! JSON bodies returned to clients.

use pricelens_core::{CandidateKind, ProductCandidate};
use serde::Serialize;

/// Body of a completed image search, including the "not recognized" outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub message: String,
    pub search_image: String,
    pub search_keyword: String,
    pub search_keywords: Vec<String>,
    pub translated_keywords: Vec<String>,
    pub detected_brand: Option<String>,
    pub detected_labels: Vec<String>,
    pub detected_entities: Vec<String>,
    pub count: usize,
    pub results: Vec<ProductCandidate>,
    pub visual_matches: Vec<ProductCandidate>,
    pub lowest_price: Option<ProductCandidate>,
    pub processing_time: String,
}

/// Body of a keyword search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSearchResponse {
    pub success: bool,
    pub message: String,
    pub search_keyword: String,
    pub search_keywords: Vec<String>,
    pub count: usize,
    pub results: Vec<ProductCandidate>,
    pub lowest_price: Option<ProductCandidate>,
    pub processing_time: String,
}

/// Ranked candidates split for the response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub results: Vec<ProductCandidate>,
    pub visual_matches: Vec<ProductCandidate>,
}

impl Partition {
    /// Unpriced look-alikes go to `visual_matches`; everything else, in rank
    /// order, to `results`.
    #[must_use]
    pub fn split(ranked: Vec<ProductCandidate>) -> Self {
        let (visual_matches, results) = ranked
            .into_iter()
            .partition(|c| c.kind == CandidateKind::VisualMatch && !c.is_priced());
        Self {
            results,
            visual_matches,
        }
    }

    /// Caps `results` and `visual_matches` separately, so look-alikes never
    /// push real listings out.
    #[must_use]
    pub fn capped(mut self, max_results: usize) -> Self {
        self.results.truncate(max_results);
        self.visual_matches.truncate(max_results);
        self
    }

    /// First priced entry among `results`.
    #[must_use]
    pub fn lowest_price(&self) -> Option<ProductCandidate> {
        self.results.iter().find(|c| c.is_priced()).cloned()
    }
}

pub(crate) fn format_elapsed(millis: u128) -> String {
    format!("{millis}ms")
}

pub(crate) fn results_message(count: usize, keyword: &str) -> String {
    if count == 0 {
        "No sellers found for this product.".to_owned()
    } else {
        format!("Found {count} listings for \"{keyword}\".")
    }
}

pub(crate) const UNRECOGNIZED_MESSAGE: &str = "Could not recognize a product in the image.";
