//! The provider seam: every image-understanding backend implements
//! [`SignalProvider`] and reports one typed [`ProviderOutput`].

use async_trait::async_trait;
use pricelens_core::{Entity, RawListing};

use crate::error::VisionError;

/// Result of a reverse-image search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LensResult {
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub titles: Vec<String>,
    /// Visually similar listings; these skip keyword search entirely.
    pub listings: Vec<RawListing>,
}

/// One provider's partial view of the image.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutput {
    Web {
        best_guess_label: Option<String>,
        entities: Vec<Entity>,
    },
    Labels(Vec<String>),
    Logos(Vec<String>),
    Text {
        tokens: Vec<String>,
        full_text: String,
    },
    Lens(LensResult),
}

#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Analyze the image at `image_url`.
    ///
    /// Callers treat any `Err` as "this provider contributed nothing".
    async fn analyze(&self, image_url: &str) -> Result<ProviderOutput, VisionError>;
}
