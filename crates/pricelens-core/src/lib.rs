//! Shared domain model, static lexicon and configuration for pricelens.

pub mod app_config;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod listing;
pub mod signals;
pub mod text;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, LexiconError};
pub use lexicon::{CurrencyRate, Lexicon, Translation};
pub use listing::{CandidateKind, ProductCandidate, RawListing};
pub use signals::{Entity, ImageSignals, ENTITY_CONFIDENCE_THRESHOLD};
