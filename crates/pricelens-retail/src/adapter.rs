//! The retrieval contract every retailer adapter implements, plus the HTTP
//! plumbing adapters share.

use std::time::Duration;

use async_trait::async_trait;
use pricelens_core::RawListing;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, Response, StatusCode};

use crate::error::RetailError;

/// Result of one adapter call for one keyword.
///
/// Failures stay inside this value until the fan-out join point, where they
/// become an empty list and a log line.
pub type RetrievalOutcome = Result<Vec<RawListing>, RetailError>;

#[async_trait]
pub trait RetailerAdapter: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    /// Whether this adapter should also be queried with locale-translated keywords.
    fn accepts_translated(&self) -> bool {
        false
    }

    async fn search(&self, keyword: &str) -> RetrievalOutcome;
}

/// Builds the `reqwest::Client` shared by the adapters.
///
/// # Errors
///
/// Returns [`RetailError::Http`] if the client cannot be constructed.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, RetailError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9"));
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .user_agent(user_agent)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Maps a non-2xx response to a typed error.
pub(crate) fn check_status(
    adapter: &str,
    url: &str,
    response: Response,
) -> Result<Response, RetailError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(RetailError::RateLimited {
            adapter: adapter.to_owned(),
            retry_after_secs,
        });
    }
    if !status.is_success() {
        return Err(RetailError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Ok(response)
}
