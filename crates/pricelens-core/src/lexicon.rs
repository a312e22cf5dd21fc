//! Static lookup tables: brands, bilingual substitutions, noise words,
//! product-type and color keywords, and currency multipliers.
//!
//! The lexicon is parsed and validated once at start-up, then shared
//! read-only (usually behind an `Arc`) by fusion, keyword synthesis and the
//! ranker.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::text::contains_word;
use crate::LexiconError;

const BUILTIN_LEXICON: &str = include_str!("../../../config/lexicon.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct Translation {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyRate {
    pub code: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Units of the target currency per one unit of `code`.
    pub rate: f64,
}

impl CurrencyRate {
    fn matches(&self, currency_upper: &str) -> bool {
        currency_upper.contains(&self.code)
            || self
                .symbols
                .iter()
                .any(|s| currency_upper.contains(&s.to_uppercase()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Lexicon {
    pub target_currency: String,
    pub brands: Vec<String>,
    #[serde(default)]
    pub brand_translations: Vec<Translation>,
    #[serde(default)]
    pub category_translations: Vec<Translation>,
    #[serde(default)]
    pub noise_words: Vec<String>,
    #[serde(default)]
    pub product_types: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub currencies: Vec<CurrencyRate>,
    #[serde(skip)]
    brands_lower: Vec<String>,
}

impl Lexicon {
    /// The lexicon compiled into the binary from `config/lexicon.yaml`.
    ///
    /// # Errors
    ///
    /// Returns [`LexiconError`] only if the embedded file is malformed.
    pub fn builtin() -> Result<Self, LexiconError> {
        Self::from_yaml_str(BUILTIN_LEXICON)
    }

    /// Load and validate a lexicon from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`LexiconError`] if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, LexiconError> {
        let content = std::fs::read_to_string(path).map_err(|e| LexiconError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Loads from `path` when given, otherwise falls back to [`Lexicon::builtin`].
    ///
    /// # Errors
    ///
    /// Propagates [`LexiconError`] from whichever source is used.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, LexiconError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    /// Parse and validate a lexicon from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`LexiconError::Parse`] or [`LexiconError::Validation`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LexiconError> {
        let mut lexicon: Lexicon = serde_yaml::from_str(yaml)?;
        lexicon.normalize();
        lexicon.validate()?;
        Ok(lexicon)
    }

    fn normalize(&mut self) {
        self.target_currency = self.target_currency.trim().to_uppercase();
        for t in self
            .brand_translations
            .iter_mut()
            .chain(self.category_translations.iter_mut())
        {
            t.from = t.from.trim().to_lowercase();
        }
        for list in [&mut self.product_types, &mut self.colors] {
            for entry in list.iter_mut() {
                *entry = entry.trim().to_lowercase();
            }
        }
        for rate in &mut self.currencies {
            rate.code = rate.code.trim().to_uppercase();
        }
        self.brands_lower = self
            .brands
            .iter()
            .map(|b| b.trim().to_lowercase())
            .collect();
    }

    fn validate(&self) -> Result<(), LexiconError> {
        if self.target_currency.len() != 3
            || !self
                .target_currency
                .chars()
                .all(|c| c.is_ascii_alphabetic())
        {
            return Err(LexiconError::Validation(format!(
                "target_currency '{}' must be a 3-letter code",
                self.target_currency
            )));
        }

        if self.brands.is_empty() {
            return Err(LexiconError::Validation(
                "brand table must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for brand in &self.brands_lower {
            if brand.is_empty() {
                return Err(LexiconError::Validation(
                    "brand names must be non-empty".to_string(),
                ));
            }
            if !seen.insert(brand.as_str()) {
                return Err(LexiconError::Validation(format!(
                    "duplicate brand: '{brand}'"
                )));
            }
        }

        if self
            .brand_translations
            .iter()
            .chain(&self.category_translations)
            .any(|t| t.from.is_empty())
        {
            return Err(LexiconError::Validation(
                "translation sources must be non-empty".to_string(),
            ));
        }

        if self.currencies.is_empty() {
            return Err(LexiconError::Validation(
                "currency table must not be empty".to_string(),
            ));
        }
        for rate in &self.currencies {
            if !(rate.rate.is_finite() && rate.rate > 0.0) {
                return Err(LexiconError::Validation(format!(
                    "currency {} has non-positive rate {}",
                    rate.code, rate.rate
                )));
            }
        }

        Ok(())
    }

    /// First brand from the table contained anywhere in `text`, ignoring case.
    /// OCR often glues words together, so no word boundary is required.
    #[must_use]
    pub fn brand_in(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.brands_lower
            .iter()
            .position(|b| lower.contains(b.as_str()))
            .map(|idx| self.brands[idx].as_str())
    }

    /// Matches a detected logo against the table by substring in both directions
    /// (`"NikeLab"` contains `"Nike"`; `"The North Face"` contains `"North Face"`).
    #[must_use]
    pub fn brand_for_logo(&self, logo: &str) -> Option<&str> {
        let lower = logo.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        self.brands_lower
            .iter()
            .position(|b| lower.contains(b.as_str()) || b.contains(lower.as_str()))
            .map(|idx| self.brands[idx].as_str())
    }

    /// `true` when `text` is nothing but a brand name from the table.
    #[must_use]
    pub fn is_brand_name(&self, text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        self.brands_lower.iter().any(|b| *b == lower)
    }

    #[must_use]
    pub fn is_color(&self, label: &str) -> bool {
        let lower = label.trim().to_lowercase();
        self.colors.iter().any(|c| *c == lower)
    }

    /// First product-type keyword contained in `label`.
    #[must_use]
    pub fn product_type_in(&self, label: &str) -> Option<&str> {
        let lower = label.to_lowercase();
        self.product_types
            .iter()
            .find(|t| lower.contains(t.as_str()))
            .map(String::as_str)
    }

    /// First color keyword appearing as a whole word in `label`.
    #[must_use]
    pub fn color_in(&self, label: &str) -> Option<&str> {
        let lower = label.to_lowercase();
        self.colors
            .iter()
            .find(|c| contains_word(&lower, c))
            .map(String::as_str)
    }

    /// Applies the brand table, then the category table, to a lowercased copy
    /// of `text`. Returns the lowercased input unchanged when nothing matched.
    #[must_use]
    pub fn translate(&self, text: &str) -> String {
        let mut result = text.to_lowercase();
        for t in self
            .brand_translations
            .iter()
            .chain(&self.category_translations)
        {
            if result.contains(&t.from) {
                result = result.replace(&t.from, &t.to);
            }
        }
        result
    }

    /// Finds the multiplier for a currency code or symbol. Table order decides
    /// ties, so symbols containing `$` are listed before the bare dollar.
    #[must_use]
    pub fn currency_rate(&self, currency: &str) -> Option<&CurrencyRate> {
        let upper = currency.trim().to_uppercase();
        if upper.is_empty() {
            return None;
        }
        self.currencies.iter().find(|r| r.matches(&upper))
    }
}
