use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Overrides the built-in lexicon when set.
    pub lexicon_path: Option<PathBuf>,
    pub google_vision_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
    /// Per external call; a call exceeding it degrades to an empty result.
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_keywords: usize,
    /// How many synthesized keywords are spent on the retailer fan-out.
    pub fanout_keywords: usize,
    pub fanout_translated_keywords: usize,
    /// Upper bound on in-flight keyword x adapter calls.
    pub max_concurrent_calls: usize,
    pub max_results: usize,
    pub rate_limit_per_minute: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("lexicon_path", &self.lexicon_path)
            .field(
                "google_vision_api_key",
                &self.google_vision_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "serpapi_api_key",
                &self.serpapi_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_keywords", &self.max_keywords)
            .field("fanout_keywords", &self.fanout_keywords)
            .field(
                "fanout_translated_keywords",
                &self.fanout_translated_keywords,
            )
            .field("max_concurrent_calls", &self.max_concurrent_calls)
            .field("max_results", &self.max_results)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
