//! Conversion of source-currency amounts into the lexicon's target currency.

use pricelens_core::Lexicon;

/// Converts `amount` tagged with `currency` into whole units of the target
/// currency, rounded to the nearest integer.
///
/// Non-positive or non-finite amounts mean "no price" and yield `0`. A
/// currency missing from the table keeps its amount unchanged, so a priced
/// row never turns into an unpriced one.
#[must_use]
pub fn to_target_price(amount: f64, currency: &str, lexicon: &Lexicon) -> u64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    let rate = match lexicon.currency_rate(currency) {
        Some(rate) => rate.rate,
        None => {
            if !currency.trim().is_empty() {
                tracing::debug!(currency, "unknown currency, keeping amount as is");
            }
            1.0
        }
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let price = (amount * rate).round().max(1.0) as u64;
    price
}
