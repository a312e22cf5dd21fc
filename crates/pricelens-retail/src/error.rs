use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {adapter} (retry after {retry_after_secs}s)")]
    RateLimited {
        adapter: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{adapter} reported an error: {message}")]
    Api { adapter: String, message: String },

    #[error("{adapter} timed out after {timeout_secs}s")]
    Timeout { adapter: String, timeout_secs: u64 },

    #[error("invalid CSS selector \"{selector}\": {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
