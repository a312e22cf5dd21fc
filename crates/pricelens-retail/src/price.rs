//! Price-text and URL helpers for scraped rows.

use reqwest::Url;

/// Parses a scraped price by keeping only its ASCII digits.
///
/// Decimal separators are dropped along with everything else, so `"35.00"`
/// reads as `3500`. Korean retailers print whole won, where this is exact.
/// Text without digits, or with more digits than fit a `u64`, yields `0.0`.
#[must_use]
pub fn parse_price_text(text: &str) -> f64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    #[allow(clippy::cast_precision_loss)]
    digits.parse::<u64>().map_or(0.0, |v| v as f64)
}

/// Resolves `href` against `base` and keeps it only if the result is http(s).
///
/// Handles absolute, scheme-relative (`//host/path`) and root-relative links.
/// Returns `None` for `javascript:`, `data:`, blank input, or an unparsable base.
#[must_use]
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let base = Url::parse(base).ok()?;
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}
