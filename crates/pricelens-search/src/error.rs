use pricelens_core::LexiconError;
use pricelens_retail::RetailError;
use pricelens_vision::VisionError;
use thiserror::Error;

use crate::session::Stage;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request itself is unusable; maps to a 4xx response.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("lexicon error: {0}")]
    Lexicon(#[from] LexiconError),

    #[error("failed to build signal provider: {0}")]
    Vision(#[from] VisionError),

    #[error("failed to build retailer adapter: {0}")]
    Retail(#[from] RetailError),

    #[error("failed to compile noise-word pattern: {0}")]
    NoisePattern(#[from] regex::Error),

    #[error("search session cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("search pipeline panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    /// `true` when the caller sent a bad request rather than the pipeline failing.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
