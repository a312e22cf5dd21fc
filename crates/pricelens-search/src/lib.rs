//! Keyword synthesis, ranking and the search pipeline for pricelens.
//!
//! [`SearchPipeline`] drives one request through signal extraction, keyword
//! synthesis, retailer fan-out and ranking, and assembles the JSON response.

pub mod clean;
pub mod currency;
pub mod error;
pub mod keywords;
pub mod pipeline;
pub mod rank;
pub mod response;
pub mod session;

pub use clean::TextCleaner;
pub use currency::to_target_price;
pub use error::PipelineError;
pub use keywords::{Detection, KeywordEngine, SearchKeywordSet};
pub use pipeline::{PipelineSettings, SearchPipeline};
pub use rank::{dedup_by_link, dedup_by_title, normalize, rank, rank_all, sort_by_price};
pub use response::{KeywordSearchResponse, Partition, SearchResponse};
pub use session::{SearchSession, Stage};
