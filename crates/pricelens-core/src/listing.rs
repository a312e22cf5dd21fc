use serde::{Deserialize, Serialize};

/// Whether a result is a purchasable listing or only a visual look-alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateKind {
    Listing,
    VisualMatch,
}

/// A listing row exactly as an adapter or provider produced it, before
/// currency conversion and link validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub title: String,
    /// Amount in the source currency; `0.0` when no price was found.
    pub amount: f64,
    /// Free-form currency code or symbol (`"KRW"`, `"$"`, `"US$"`, ...).
    pub currency: String,
    /// May be relative or empty; the normalizer drops rows it cannot resolve.
    pub link: String,
    pub thumbnail: Option<String>,
    pub source: String,
    pub kind: CandidateKind,
}

/// Canonical result unit returned to clients.
///
/// `price` is always expressed in the lexicon's target currency; `0` means
/// the price is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCandidate {
    pub name: String,
    pub price: u64,
    pub currency: String,
    pub link: String,
    pub image: Option<String>,
    pub source: String,
    pub kind: CandidateKind,
}

impl ProductCandidate {
    #[must_use]
    pub fn is_priced(&self) -> bool {
        self.price > 0
    }
}
