//! Keyword × adapter fan-out with per-call isolation.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use pricelens_core::RawListing;

use crate::adapter::{RetailerAdapter, RetrievalOutcome};
use crate::error::RetailError;

/// How much of the keyword list is spent on external calls, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanoutLimits {
    /// Leading source-locale keywords sent to every adapter.
    pub keywords: usize,
    /// Leading translated keywords sent to adapters that accept them.
    pub translated_keywords: usize,
    /// Maximum calls in flight at once.
    pub max_concurrent: usize,
    /// Deadline for each individual call.
    pub call_timeout: Duration,
}

impl Default for FanoutLimits {
    fn default() -> Self {
        Self {
            keywords: 3,
            translated_keywords: 2,
            max_concurrent: 16,
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// The (adapter, keyword) pairs a fan-out will issue, in issue order.
///
/// Pairs are owned so the calls built from them can move onto any task.
#[must_use]
pub fn plan_calls(
    adapters: &[Arc<dyn RetailerAdapter>],
    keywords: &[String],
    translated: &[String],
    limits: &FanoutLimits,
) -> Vec<(Arc<dyn RetailerAdapter>, String)> {
    let primary = keywords
        .iter()
        .take(limits.keywords)
        .flat_map(|kw| adapters.iter().map(move |a| (Arc::clone(a), kw.clone())));
    let localized = translated
        .iter()
        .take(limits.translated_keywords)
        .flat_map(|kw| {
            adapters
                .iter()
                .filter(|a| a.accepts_translated())
                .map(move |a| (Arc::clone(a), kw.clone()))
        });
    primary.chain(localized).collect()
}

/// Runs every planned call and flattens the successful rows in plan order.
///
/// Each call has its own timeout; an error or timeout from one call becomes an
/// empty contribution and never affects its siblings.
pub async fn retrieve(
    adapters: &[Arc<dyn RetailerAdapter>],
    keywords: &[String],
    translated: &[String],
    limits: &FanoutLimits,
) -> Vec<RawListing> {
    let calls = plan_calls(adapters, keywords, translated, limits);
    let call_count = calls.len();
    let timeout = limits.call_timeout;

    let pending: Vec<_> = calls
        .into_iter()
        .map(|(adapter, keyword)| run_call(adapter, keyword, timeout))
        .collect();
    let outcomes: Vec<Vec<RawListing>> = stream::iter(pending)
        .buffered(limits.max_concurrent.max(1))
        .collect()
        .await;

    let listings: Vec<RawListing> = outcomes.into_iter().flatten().collect();
    tracing::info!(
        calls = call_count,
        listings = listings.len(),
        "retailer fan-out complete"
    );
    listings
}

/// Issues one planned call under its own timeout.
async fn run_call(
    adapter: Arc<dyn RetailerAdapter>,
    keyword: String,
    timeout: Duration,
) -> Vec<RawListing> {
    let outcome = match tokio::time::timeout(timeout, adapter.search(&keyword)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(RetailError::Timeout {
            adapter: adapter.name().to_owned(),
            timeout_secs: timeout.as_secs(),
        }),
    };
    absorb(adapter.name(), &keyword, outcome)
}

/// The single point where an adapter failure turns into an empty result.
fn absorb(adapter: &'static str, keyword: &str, outcome: RetrievalOutcome) -> Vec<RawListing> {
    match outcome {
        Ok(rows) => {
            tracing::debug!(
                adapter,
                keyword,
                rows = rows.len(),
                "retailer search succeeded"
            );
            rows
        }
        Err(e) => {
            tracing::warn!(adapter, keyword, error = %e, "retailer search failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "fanout_test.rs"]
mod tests;
