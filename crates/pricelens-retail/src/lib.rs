//! Retailer retrieval for pricelens.
//!
//! Scraping adapters for Korean marketplaces plus a structured Google
//! Shopping adapter, all behind [`RetailerAdapter`], and the fan-out that
//! queries them concurrently while isolating each call's failure.

pub mod adapter;
pub mod error;
pub mod fanout;
pub mod html;
pub mod price;
pub mod shopping;
pub mod sites;

pub use adapter::{build_http_client, RetailerAdapter, RetrievalOutcome};
pub use error::RetailError;
pub use fanout::{plan_calls, retrieve, FanoutLimits};
pub use html::HtmlAdapter;
pub use price::{absolutize, parse_price_text};
pub use shopping::ShoppingAdapter;
pub use sites::{SiteProfile, ALL_SITES};
