//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dialectic_engine::config::{Config, LogFormat};
use dialectic_engine::error::AppError;
use serial_test::serial;

const VARS: &[&str] = &[
    "DIALECTIC_MODEL",
    "DIALECTIC_MAX_TOKENS",
    "DIALECTIC_TEMPERATURE",
    "DIALECTIC_VALIDATE",
    "DIALECTIC_CACHE_ENABLED",
    "DIALECTIC_CACHE_DIR",
    "DIALECTIC_CACHE_TTL_SECS",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "LANGBASE_BASE_URL",
    "LANGBASE_PIPE",
    "REQUEST_TIMEOUT_MS",
    "MAX_RETRIES",
    "RETRY_DELAY_MS",
];

/// Clear overrides and set the one required variable
fn reset_env() {
    for var in VARS {
        env::remove_var(var);
    }
    env::set_var("LANGBASE_API_KEY", "test-key");
}

#[test]
#[serial]
fn test_config_from_env_defaults() {
    reset_env();

    let config = Config::from_env().unwrap();
    assert_eq!(config.langbase.api_key, "test-key");
    assert_eq!(config.langbase.pipe, "dialectic-v1");
    assert_eq!(config.engine.model, "openai:gpt-4o-mini");
    assert_eq!(config.engine.max_tokens, 2000);
    assert!(config.cache.enabled);
    assert!(config.cache.ttl.is_none());
    assert_eq!(config.request.max_retries, 3);
}

#[test]
#[serial]
fn test_config_from_env_engine_overrides() {
    reset_env();
    env::set_var("DIALECTIC_MODEL", "anthropic:claude-haiku");
    env::set_var("DIALECTIC_MAX_TOKENS", "512");
    env::set_var("DIALECTIC_TEMPERATURE", "0.2");
    env::set_var("DIALECTIC_VALIDATE", "true");

    let config = Config::from_env().unwrap();
    assert_eq!(config.engine.model, "anthropic:claude-haiku");
    assert_eq!(config.engine.max_tokens, 512);
    assert!((config.engine.temperature - 0.2).abs() < f32::EPSILON);
    assert!(config.engine.validate_results);

    reset_env();
}

#[test]
#[serial]
fn test_config_from_env_cache_overrides() {
    reset_env();
    env::set_var("DIALECTIC_CACHE_ENABLED", "false");
    env::set_var("DIALECTIC_CACHE_DIR", "/tmp/dialectic-cache");
    env::set_var("DIALECTIC_CACHE_TTL_SECS", "3600");

    let config = Config::from_env().unwrap();
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.directory, PathBuf::from("/tmp/dialectic-cache"));
    assert_eq!(config.cache.ttl, Some(Duration::from_secs(3600)));

    reset_env();
}

#[test]
#[serial]
fn test_config_from_env_zero_ttl_never_expires() {
    reset_env();
    env::set_var("DIALECTIC_CACHE_TTL_SECS", "0");

    let config = Config::from_env().unwrap();
    assert!(config.cache.ttl.is_none());

    reset_env();
}

#[test]
#[serial]
fn test_config_from_env_json_logging() {
    reset_env();
    env::set_var("LOG_FORMAT", "JSON");
    env::set_var("LOG_LEVEL", "debug");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.level, "debug");

    reset_env();
}

#[test]
#[serial]
fn test_config_from_env_request_overrides() {
    reset_env();
    env::set_var("LANGBASE_BASE_URL", "https://custom.api.com");
    env::set_var("LANGBASE_PIPE", "my-pipe");
    env::set_var("REQUEST_TIMEOUT_MS", "60000");
    env::set_var("MAX_RETRIES", "5");
    env::set_var("RETRY_DELAY_MS", "2000");

    let config = Config::from_env().unwrap();
    assert_eq!(config.langbase.base_url, "https://custom.api.com");
    assert_eq!(config.langbase.pipe, "my-pipe");
    assert_eq!(config.request.timeout_ms, 60000);
    assert_eq!(config.request.max_retries, 5);
    assert_eq!(config.request.retry_delay_ms, 2000);

    reset_env();
}

#[test]
#[serial]
fn test_config_from_env_rejects_malformed_number() {
    reset_env();
    env::set_var("DIALECTIC_MAX_TOKENS", "lots");

    let err = Config::from_env().unwrap_err();
    match err {
        AppError::Config { message } => assert!(message.contains("DIALECTIC_MAX_TOKENS")),
        other => panic!("expected Config error, got {:?}", other),
    }

    reset_env();
}
