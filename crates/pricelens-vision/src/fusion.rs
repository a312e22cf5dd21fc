//! Merges provider outputs into one [`ImageSignals`] and derives the
//! brand, product type and color from it.
//!
//! Everything here is pure: no I/O, no failure modes. An empty input slice
//! yields `ImageSignals::default()`.

use std::collections::HashSet;

use pricelens_core::{ImageSignals, Lexicon, RawListing, ENTITY_CONFIDENCE_THRESHOLD};

use crate::provider::ProviderOutput;

/// Merge provider outputs in the order given.
///
/// Entity lists are concatenated with their reported confidence; labels,
/// logos and OCR tokens are concatenated and deduplicated case-insensitively;
/// single-valued fields keep the first non-empty value seen.
#[must_use]
pub fn fuse(outputs: &[ProviderOutput]) -> ImageSignals {
    let mut signals = ImageSignals::default();
    let mut seen_labels = HashSet::new();
    let mut seen_logos = HashSet::new();
    let mut seen_tokens = HashSet::new();
    let mut seen_titles = HashSet::new();

    for output in outputs {
        match output {
            ProviderOutput::Web {
                best_guess_label,
                entities,
            } => {
                if signals.best_guess_label.is_none() {
                    signals.best_guess_label = non_blank(best_guess_label.as_deref());
                }
                signals.entities.extend(entities.iter().cloned());
            }
            ProviderOutput::Labels(labels) => {
                push_unique(&mut signals.labels, &mut seen_labels, labels);
            }
            ProviderOutput::Logos(logos) => {
                push_unique(&mut signals.logos, &mut seen_logos, logos);
            }
            ProviderOutput::Text { tokens, full_text } => {
                push_unique(&mut signals.ocr_tokens, &mut seen_tokens, tokens);
                let text = full_text.trim();
                if !text.is_empty() {
                    if !signals.ocr_full_text.is_empty() {
                        signals.ocr_full_text.push('\n');
                    }
                    signals.ocr_full_text.push_str(text);
                }
            }
            ProviderOutput::Lens(lens) => {
                if signals.reverse_search_product_name.is_none() {
                    signals.reverse_search_product_name = non_blank(lens.product_name.as_deref());
                }
                if signals.reverse_search_brand.is_none() {
                    signals.reverse_search_brand = non_blank(lens.brand.as_deref());
                }
                push_unique(
                    &mut signals.reverse_search_titles,
                    &mut seen_titles,
                    &lens.titles,
                );
            }
        }
    }

    signals
}

/// Raw listings returned by reverse-image search, in provider order.
#[must_use]
pub fn lens_listings(outputs: &[ProviderOutput]) -> Vec<RawListing> {
    outputs
        .iter()
        .filter_map(|output| match output {
            ProviderOutput::Lens(lens) => Some(lens.listings.iter().cloned()),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Picks at most one brand, by source priority:
/// logo, OCR text, confident entities, labels, then the reverse-search brand.
#[must_use]
pub fn detect_brand(signals: &ImageSignals, lexicon: &Lexicon) -> Option<String> {
    if let Some(brand) = signals
        .logos
        .iter()
        .find_map(|logo| lexicon.brand_for_logo(logo))
    {
        return Some(brand.to_string());
    }

    let ocr_text = if signals.ocr_full_text.trim().is_empty() {
        signals.ocr_tokens.join(" ")
    } else {
        signals.ocr_full_text.clone()
    };
    if let Some(brand) = lexicon.brand_in(&ocr_text) {
        return Some(brand.to_string());
    }

    if let Some(brand) = signals
        .confident_entities(ENTITY_CONFIDENCE_THRESHOLD)
        .find_map(|e| lexicon.brand_in(&e.text))
    {
        return Some(brand.to_string());
    }

    if let Some(brand) = signals.labels.iter().find_map(|l| lexicon.brand_in(l)) {
        return Some(brand.to_string());
    }

    let fallback = signals.reverse_search_brand.as_deref()?.trim();
    if fallback.is_empty() {
        return None;
    }
    Some(
        lexicon
            .brand_in(fallback)
            .map_or_else(|| fallback.to_string(), str::to_string),
    )
}

/// First product-type keyword found in the labels, in label order.
#[must_use]
pub fn detect_product_type(signals: &ImageSignals, lexicon: &Lexicon) -> Option<String> {
    signals
        .labels
        .iter()
        .find_map(|l| lexicon.product_type_in(l))
        .map(str::to_string)
}

/// First color keyword found in the labels, in label order.
#[must_use]
pub fn detect_color(signals: &ImageSignals, lexicon: &Lexicon) -> Option<String> {
    signals
        .labels
        .iter()
        .find_map(|l| lexicon.color_in(l))
        .map(str::to_string)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn push_unique(target: &mut Vec<String>, seen: &mut HashSet<String>, items: &[String]) {
    for item in items {
        let trimmed = item.trim();
        if !trimmed.is_empty() && seen.insert(trimmed.to_lowercase()) {
            target.push(trimmed.to_string());
        }
    }
}

#[cfg(test)]
#[path = "fusion_test.rs"]
mod tests;
