/// Entities at or below this confidence are ignored for brand detection
/// and keyword synthesis.
pub const ENTITY_CONFIDENCE_THRESHOLD: f32 = 0.3;

/// A ranked descriptor reported by the web-entity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub text: String,
    /// Provider-reported confidence in `0.0..=1.0`.
    pub confidence: f32,
}

/// Everything the signal providers could tell us about one image.
///
/// Every field may be empty; an all-empty value is the normal outcome when
/// image recognition failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageSignals {
    pub best_guess_label: Option<String>,
    pub entities: Vec<Entity>,
    pub labels: Vec<String>,
    pub logos: Vec<String>,
    pub ocr_tokens: Vec<String>,
    pub ocr_full_text: String,
    pub reverse_search_product_name: Option<String>,
    pub reverse_search_brand: Option<String>,
    pub reverse_search_titles: Vec<String>,
}

impl ImageSignals {
    /// `true` when no provider contributed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.best_guess_label.is_none()
            && self.entities.is_empty()
            && self.labels.is_empty()
            && self.logos.is_empty()
            && self.ocr_tokens.is_empty()
            && self.ocr_full_text.trim().is_empty()
            && self.reverse_search_product_name.is_none()
            && self.reverse_search_brand.is_none()
            && self.reverse_search_titles.is_empty()
    }

    /// Entities above `threshold`, in provider rank order.
    pub fn confident_entities(&self, threshold: f32) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| e.confidence > threshold && !e.text.trim().is_empty())
    }
}
