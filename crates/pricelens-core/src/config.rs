use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `.env` templates with blank keys work.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    // Zero would disable a stage entirely, which is never what an operator means.
    let parse_positive = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("PRICELENS_ENV", "development"));

    let bind_addr = or_default("PRICELENS_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("PRICELENS_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("PRICELENS_LOG_LEVEL", "info");
    let lexicon_path = optional("PRICELENS_LEXICON_PATH").map(PathBuf::from);

    let google_vision_api_key = optional("GOOGLE_VISION_API_KEY");
    let serpapi_api_key = optional("SERPAPI_API_KEY");

    let request_timeout_secs = parse_u64("PRICELENS_REQUEST_TIMEOUT_SECS", "10")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "PRICELENS_REQUEST_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let user_agent = or_default("PRICELENS_USER_AGENT", DEFAULT_USER_AGENT);

    let max_keywords = parse_positive("PRICELENS_MAX_KEYWORDS", "8")?;
    let fanout_keywords = parse_positive("PRICELENS_FANOUT_KEYWORDS", "3")?;
    let fanout_translated_keywords = or_default("PRICELENS_FANOUT_TRANSLATED_KEYWORDS", "2")
        .parse::<usize>()
        .map_err(|e| invalid("PRICELENS_FANOUT_TRANSLATED_KEYWORDS", e.to_string()))?;
    let max_concurrent_calls = parse_positive("PRICELENS_MAX_CONCURRENT_CALLS", "16")?;
    let max_results = parse_positive("PRICELENS_MAX_RESULTS", "50")?;
    let rate_limit_per_minute = parse_positive("PRICELENS_RATE_LIMIT_PER_MINUTE", "30")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        lexicon_path,
        google_vision_api_key,
        serpapi_api_key,
        request_timeout_secs,
        user_agent,
        max_keywords,
        fanout_keywords: fanout_keywords.min(max_keywords),
        fanout_translated_keywords,
        max_concurrent_calls,
        max_results,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
