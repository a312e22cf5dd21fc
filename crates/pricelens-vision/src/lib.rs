//! Image signal extraction for pricelens.
//!
//! Calls the image-understanding providers (Google Cloud Vision web, label,
//! logo and text detection plus a SerpApi Google Lens reverse-image search)
//! concurrently, absorbs any provider failure into an empty contribution,
//! and fuses whatever came back into one [`pricelens_core::ImageSignals`].

pub mod collect;
pub mod error;
pub mod fusion;
pub mod google;
pub mod lens;
pub mod provider;

pub use collect::collect_signals;
pub use error::VisionError;
pub use fusion::{detect_brand, detect_color, detect_product_type, fuse, lens_listings};
pub use google::{GoogleVisionClient, GoogleVisionProvider, VisionFeature};
pub use lens::{LensProvider, SerpApiLensClient};
pub use provider::{LensResult, ProviderOutput, SignalProvider};
