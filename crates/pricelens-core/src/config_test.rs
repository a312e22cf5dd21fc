use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_production() {
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test"), Environment::Test);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.lexicon_path.is_none());
    assert!(cfg.google_vision_api_key.is_none());
    assert!(cfg.serpapi_api_key.is_none());
    assert_eq!(cfg.request_timeout_secs, 10);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.max_keywords, 8);
    assert_eq!(cfg.fanout_keywords, 3);
    assert_eq!(cfg.fanout_translated_keywords, 2);
    assert_eq!(cfg.max_concurrent_calls, 16);
    assert_eq!(cfg.max_results, 50);
    assert_eq!(cfg.rate_limit_per_minute, 30);
}

#[test]
fn build_app_config_reads_api_keys() {
    let mut map = HashMap::new();
    map.insert("GOOGLE_VISION_API_KEY", "vision-key");
    map.insert("SERPAPI_API_KEY", "serp-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.google_vision_api_key.as_deref(), Some("vision-key"));
    assert_eq!(cfg.serpapi_api_key.as_deref(), Some("serp-key"));
}

#[test]
fn build_app_config_treats_blank_api_key_as_unset() {
    let mut map = HashMap::new();
    map.insert("SERPAPI_API_KEY", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.serpapi_api_key.is_none());
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("PRICELENS_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICELENS_BIND_ADDR"),
        "expected InvalidEnvVar(PRICELENS_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_timeout() {
    let mut map = HashMap::new();
    map.insert("PRICELENS_REQUEST_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICELENS_REQUEST_TIMEOUT_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_max_keywords() {
    let mut map = HashMap::new();
    map.insert("PRICELENS_MAX_KEYWORDS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICELENS_MAX_KEYWORDS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_numeric_max_results() {
    let mut map = HashMap::new();
    map.insert("PRICELENS_MAX_RESULTS", "lots");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn build_app_config_caps_fanout_at_max_keywords() {
    let mut map = HashMap::new();
    map.insert("PRICELENS_MAX_KEYWORDS", "2");
    map.insert("PRICELENS_FANOUT_KEYWORDS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.fanout_keywords, 2);
}

#[test]
fn build_app_config_allows_disabling_translated_fanout() {
    let mut map = HashMap::new();
    map.insert("PRICELENS_FANOUT_TRANSLATED_KEYWORDS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.fanout_translated_keywords, 0);
}

#[test]
fn debug_output_redacts_api_keys() {
    let mut map = HashMap::new();
    map.insert("GOOGLE_VISION_API_KEY", "super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[redacted]"));
}
