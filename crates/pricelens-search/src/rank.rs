//! Normalization, deduplication and price ordering of candidates.

use std::collections::HashSet;

use pricelens_core::text::collapse_whitespace;
use pricelens_core::{Lexicon, ProductCandidate, RawListing};

use crate::currency::to_target_price;

/// Characters of the whitespace-free lowercase title compared by title dedup.
const TITLE_KEY_CHARS: usize = 30;

pub(crate) fn is_http_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    let has_scheme = lower.starts_with("http://") || lower.starts_with("https://");
    has_scheme && lower.len() > "https://".len()
}

/// Maps one adapter row to a canonical candidate, converting its price into
/// the lexicon's target currency. Rows without an absolute http(s) link are
/// dropped.
#[must_use]
pub fn normalize(raw: RawListing, lexicon: &Lexicon) -> Option<ProductCandidate> {
    if !is_http_url(&raw.link) {
        return None;
    }
    Some(ProductCandidate {
        name: collapse_whitespace(&raw.title),
        price: to_target_price(raw.amount, &raw.currency, lexicon),
        currency: lexicon.target_currency.clone(),
        link: raw.link.trim().to_owned(),
        image: raw.thumbnail.filter(|t| is_http_url(t)),
        source: raw.source,
        kind: raw.kind,
    })
}

fn link_key(link: &str) -> String {
    link.split('?').next().unwrap_or(link).to_lowercase()
}

fn title_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(TITLE_KEY_CHARS)
        .collect()
}

/// Keeps the first candidate per link, ignoring query string and case.
#[must_use]
pub fn dedup_by_link(candidates: Vec<ProductCandidate>) -> Vec<ProductCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(link_key(&c.link)))
        .collect()
}

/// Keeps the first candidate per title prefix. Untitled candidates are
/// never considered duplicates of each other.
#[must_use]
pub fn dedup_by_title(candidates: Vec<ProductCandidate>) -> Vec<ProductCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| {
            let key = title_key(&c.name);
            key.is_empty() || seen.insert(key)
        })
        .collect()
}

/// Priced candidates first in ascending price; unpriced ones keep their order.
pub fn sort_by_price(candidates: &mut [ProductCandidate]) {
    candidates.sort_by_key(|c| (!c.is_priced(), c.price));
}

/// Normalizes, deduplicates and sorts every row without truncating.
#[must_use]
pub fn rank_all(raw: Vec<RawListing>, lexicon: &Lexicon) -> Vec<ProductCandidate> {
    let incoming = raw.len();
    let normalized: Vec<ProductCandidate> = raw
        .into_iter()
        .filter_map(|r| normalize(r, lexicon))
        .collect();
    let mut ranked = dedup_by_title(dedup_by_link(normalized));
    sort_by_price(&mut ranked);
    tracing::debug!(incoming, kept = ranked.len(), "ranked candidates");
    ranked
}

/// [`rank_all`], then truncated to `max_results`.
#[must_use]
pub fn rank(raw: Vec<RawListing>, lexicon: &Lexicon, max_results: usize) -> Vec<ProductCandidate> {
    let mut ranked = rank_all(raw, lexicon);
    ranked.truncate(max_results);
    ranked
}

#[cfg(test)]
#[path = "rank_test.rs"]
mod tests;
