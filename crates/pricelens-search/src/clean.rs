//! Text cleaning for keyword candidates.

use pricelens_core::text::collapse_whitespace;
use pricelens_core::Lexicon;
use regex::Regex;

/// Cleaned strings shorter than this are discarded.
pub const MIN_CLEAN_CHARS: usize = 3;

/// Punctuation replaced by a space before whitespace is collapsed.
const STRIPPED_PUNCTUATION: &str = "|/\\-_[](){}:;'\"<>#@!?*&^%$~`+=";

/// Removes marketplace noise words and punctuation from free text.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    noise: Option<Regex>,
}

impl TextCleaner {
    /// Compiles the lexicon's noise words into one case-insensitive,
    /// whole-word pattern.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the combined pattern exceeds the regex size limit.
    pub fn new(lexicon: &Lexicon) -> Result<Self, regex::Error> {
        let mut words: Vec<&str> = lexicon
            .noise_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Ok(Self { noise: None });
        }
        // Longest first so multi-word phrases win over their prefixes.
        words.sort_by_key(|w| std::cmp::Reverse(w.len()));
        let alternation = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        let noise = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?;
        Ok(Self { noise: Some(noise) })
    }

    /// Cleans `text`, returning `None` when fewer than three characters survive.
    #[must_use]
    pub fn clean(&self, text: &str) -> Option<String> {
        let without_noise = match &self.noise {
            Some(re) => re.replace_all(text, " ").into_owned(),
            None => text.to_owned(),
        };
        let without_punct: String = without_noise
            .chars()
            .map(|c| if STRIPPED_PUNCTUATION.contains(c) { ' ' } else { c })
            .collect();
        let cleaned = collapse_whitespace(&without_punct);
        (cleaned.chars().count() >= MIN_CLEAN_CHARS).then_some(cleaned)
    }
}
