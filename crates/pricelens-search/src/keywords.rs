//! Keyword synthesis: turns fused image signals into an ordered, bounded set
//! of search keywords plus their locale-translated variants.
//!
//! Synthesis runs a fixed list of rule functions in priority order. Each rule
//! only proposes candidates; [`KeywordSet`] decides what is kept, so earlier
//! rules always win and later rules can only add what is not yet present.

use std::collections::HashSet;

use pricelens_core::text::collapse_whitespace;
use pricelens_core::{ImageSignals, Lexicon, ENTITY_CONFIDENCE_THRESHOLD};
use pricelens_vision::{detect_brand, detect_color, detect_product_type};

use crate::clean::{TextCleaner, MIN_CLEAN_CHARS};

/// Entities considered by the entity rule, in rank order.
const ENTITY_KEYWORD_LIMIT: usize = 3;
/// OCR tokens considered by the model-number rule.
const MODEL_NUMBER_LIMIT: usize = 2;

/// Brand, product type and color derived from one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub brand: Option<String>,
    pub product_type: Option<String>,
    pub color: Option<String>,
}

impl Detection {
    #[must_use]
    pub fn from_signals(signals: &ImageSignals, lexicon: &Lexicon) -> Self {
        Self {
            brand: detect_brand(signals, lexicon),
            product_type: detect_product_type(signals, lexicon),
            color: detect_color(signals, lexicon),
        }
    }
}

/// Ordered search keywords and their translations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchKeywordSet {
    pub keywords: Vec<String>,
    pub translated_keywords: Vec<String>,
}

impl SearchKeywordSet {
    /// No keyword could be built: the product was not recognized.
    #[must_use]
    pub fn is_unrecognized(&self) -> bool {
        self.keywords.is_empty()
    }

    /// The highest-priority keyword, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.keywords.first().map(String::as_str)
    }
}

/// Insertion-ordered accumulator that rejects short strings and
/// case-insensitive duplicates and stops growing at `max`.
#[derive(Debug)]
pub(crate) struct KeywordSet {
    items: Vec<String>,
    seen: HashSet<String>,
    max: usize,
}

impl KeywordSet {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            max,
        }
    }

    /// Marks `existing` as taken without adding it to this set.
    pub(crate) fn exclude<'a>(&mut self, existing: impl IntoIterator<Item = &'a String>) {
        let taken = existing
            .into_iter()
            .map(|s| collapse_whitespace(s).to_lowercase());
        self.seen.extend(taken);
    }

    pub(crate) fn push(&mut self, candidate: &str) -> bool {
        let candidate = collapse_whitespace(candidate);
        if self.items.len() >= self.max || candidate.chars().count() < MIN_CLEAN_CHARS {
            return false;
        }
        if !self.seen.insert(candidate.to_lowercase()) {
            return false;
        }
        self.items.push(candidate);
        true
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Everything a rule may read.
pub(crate) struct RuleInput<'a> {
    pub signals: &'a ImageSignals,
    pub detection: &'a Detection,
    pub lexicon: &'a Lexicon,
    pub cleaner: &'a TextCleaner,
}

type Rule = fn(&RuleInput<'_>) -> Vec<String>;

/// Synthesis rules, highest priority first.
const RULES: [Rule; 7] = [
    brand_with_product_type,
    brand_without_product_type,
    best_guess,
    reverse_search,
    confident_entities,
    label_pair,
    model_numbers,
];

/// Prefixes `text` with `brand` unless the brand already appears in it.
fn with_brand(brand: Option<&str>, text: &str) -> String {
    match brand {
        Some(b) if !text.to_lowercase().contains(&b.to_lowercase()) => format!("{b} {text}"),
        _ => text.to_owned(),
    }
}

fn non_color_labels<'a>(input: &'a RuleInput<'a>) -> impl Iterator<Item = &'a String> {
    input
        .signals
        .labels
        .iter()
        .filter(|l| !input.lexicon.is_color(l))
}

pub(crate) fn brand_with_product_type(input: &RuleInput<'_>) -> Vec<String> {
    let (Some(brand), Some(kind)) = (&input.detection.brand, &input.detection.product_type) else {
        return Vec::new();
    };
    let mut out = vec![format!("{brand} {kind}")];
    if let Some(color) = &input.detection.color {
        out.push(format!("{brand} {color} {kind}"));
    }
    out
}

pub(crate) fn brand_without_product_type(input: &RuleInput<'_>) -> Vec<String> {
    let Some(brand) = &input.detection.brand else {
        return Vec::new();
    };
    if input.detection.product_type.is_some() {
        return Vec::new();
    }
    let label = non_color_labels(input).find(|l| !input.lexicon.is_brand_name(l));
    match label {
        Some(label) => vec![with_brand(Some(brand.as_str()), label)],
        None => vec![brand.clone()],
    }
}

pub(crate) fn best_guess(input: &RuleInput<'_>) -> Vec<String> {
    input
        .signals
        .best_guess_label
        .as_deref()
        .and_then(|label| input.cleaner.clean(label))
        .map(|cleaned| with_brand(input.detection.brand.as_deref(), &cleaned))
        .into_iter()
        .collect()
}

pub(crate) fn reverse_search(input: &RuleInput<'_>) -> Vec<String> {
    input
        .signals
        .reverse_search_product_name
        .iter()
        .chain(&input.signals.reverse_search_titles)
        .filter_map(|title| input.cleaner.clean(title))
        .collect()
}

pub(crate) fn confident_entities(input: &RuleInput<'_>) -> Vec<String> {
    input
        .signals
        .confident_entities(ENTITY_CONFIDENCE_THRESHOLD)
        .filter(|e| !input.lexicon.is_brand_name(&e.text))
        .take(ENTITY_KEYWORD_LIMIT)
        .filter_map(|e| input.cleaner.clean(&e.text))
        .map(|cleaned| with_brand(input.detection.brand.as_deref(), &cleaned))
        .collect()
}

pub(crate) fn label_pair(input: &RuleInput<'_>) -> Vec<String> {
    if input.detection.brand.is_some() {
        return Vec::new();
    }
    let pair: Vec<&String> = non_color_labels(input).take(2).collect();
    match pair.as_slice() {
        [first, second] => vec![format!("{first} {second}")],
        _ => Vec::new(),
    }
}

/// Letters and digits mixed, like `DH1234-100` or `WH1000XM5`.
pub(crate) fn looks_like_model_number(token: &str) -> bool {
    token.len() >= 3
        && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && token.chars().any(|c| c.is_ascii_alphabetic())
        && token.chars().any(|c| c.is_ascii_digit())
}

pub(crate) fn model_numbers(input: &RuleInput<'_>) -> Vec<String> {
    input
        .signals
        .ocr_tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| looks_like_model_number(t))
        .take(MODEL_NUMBER_LIMIT)
        .map(|t| with_brand(input.detection.brand.as_deref(), t))
        .collect()
}

/// Builds keyword sets against one lexicon.
pub struct KeywordEngine<'a> {
    lexicon: &'a Lexicon,
    cleaner: &'a TextCleaner,
    max_keywords: usize,
}

impl<'a> KeywordEngine<'a> {
    #[must_use]
    pub fn new(lexicon: &'a Lexicon, cleaner: &'a TextCleaner, max_keywords: usize) -> Self {
        Self {
            lexicon,
            cleaner,
            max_keywords,
        }
    }

    /// Runs every rule in priority order, then translates what was kept.
    #[must_use]
    pub fn synthesize(&self, signals: &ImageSignals, detection: &Detection) -> SearchKeywordSet {
        let input = RuleInput {
            signals,
            detection,
            lexicon: self.lexicon,
            cleaner: self.cleaner,
        };

        let mut set = KeywordSet::new(self.max_keywords);
        for rule in RULES {
            for candidate in rule(&input) {
                set.push(&candidate);
            }
        }
        let keywords = set.into_vec();
        let translated_keywords = self.translate(&keywords);

        tracing::debug!(
            keywords = ?keywords,
            translated = ?translated_keywords,
            "synthesized keywords"
        );
        SearchKeywordSet {
            keywords,
            translated_keywords,
        }
    }

    /// Bilingual substitutions of `keywords` that actually changed something,
    /// deduplicated against `keywords` and each other.
    #[must_use]
    pub fn translate(&self, keywords: &[String]) -> Vec<String> {
        let mut set = KeywordSet::new(self.max_keywords);
        set.exclude(keywords);
        for keyword in keywords {
            let translated = self.lexicon.translate(keyword);
            if translated != keyword.to_lowercase() {
                set.push(&translated);
            }
        }
        set.into_vec()
    }
}

#[cfg(test)]
#[path = "keywords_test.rs"]
mod tests;
