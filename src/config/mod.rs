use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Application configuration.
///
/// Built once (either explicitly or via [`Config::from_env`]) and passed by
/// value into the service, engine and cache constructors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub engine: EngineConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    pub langbase: LangbaseConfig,
    pub request: RequestConfig,
}

/// Pipeline generation settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model identifier reported in metadata and folded into cache keys.
    pub model: String,
    /// Token budget for each phase call.
    pub max_tokens: u32,
    /// Sampling temperature for thesis/antithesis/synthesis calls.
    pub temperature: f32,
    /// Token budget for the conflict classifier call.
    pub classifier_max_tokens: u32,
    /// Validate every result against the public schema before returning it.
    pub validate_results: bool,
}

/// Result cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    /// Entries older than this are treated as missing. `None` never expires.
    pub ttl: Option<Duration>,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Langbase API configuration
#[derive(Debug, Clone)]
pub struct LangbaseConfig {
    pub api_key: String,
    pub base_url: String,
    /// Pipe that serves every phase call.
    pub pipe: String,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let engine_defaults = EngineConfig::default();
        let engine = EngineConfig {
            model: env::var("DIALECTIC_MODEL").unwrap_or(engine_defaults.model),
            max_tokens: parse_var("DIALECTIC_MAX_TOKENS")?.unwrap_or(engine_defaults.max_tokens),
            temperature: parse_var("DIALECTIC_TEMPERATURE")?
                .unwrap_or(engine_defaults.temperature),
            classifier_max_tokens: engine_defaults.classifier_max_tokens,
            validate_results: bool_var("DIALECTIC_VALIDATE")
                .unwrap_or(engine_defaults.validate_results),
        };

        let cache_defaults = CacheConfig::default();
        let cache = CacheConfig {
            enabled: bool_var("DIALECTIC_CACHE_ENABLED").unwrap_or(cache_defaults.enabled),
            directory: env::var("DIALECTIC_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(cache_defaults.directory),
            ttl: match parse_var::<u64>("DIALECTIC_CACHE_TTL_SECS")? {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => cache_defaults.ttl,
            },
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let langbase = LangbaseConfig {
            api_key: env::var("LANGBASE_API_KEY").map_err(|_| AppError::Config {
                message: "LANGBASE_API_KEY is required".to_string(),
            })?,
            base_url: env::var("LANGBASE_BASE_URL")
                .unwrap_or_else(|_| "https://api.langbase.com".to_string()),
            pipe: env::var("LANGBASE_PIPE").unwrap_or_else(|_| "dialectic-v1".to_string()),
        };

        let request_defaults = RequestConfig::default();
        let request = RequestConfig {
            timeout_ms: parse_var("REQUEST_TIMEOUT_MS")?.unwrap_or(request_defaults.timeout_ms),
            max_retries: parse_var("MAX_RETRIES")?.unwrap_or(request_defaults.max_retries),
            retry_delay_ms: parse_var("RETRY_DELAY_MS")?
                .unwrap_or(request_defaults.retry_delay_ms),
        };

        Ok(Config {
            engine,
            cache,
            logging,
            langbase,
            request,
        })
    }
}

/// Parse an optional numeric variable, rejecting values that are present but malformed.
fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, AppError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| AppError::Config {
            message: format!("{} has an invalid value: '{}'", name, raw),
        }),
        Err(_) => Ok(None),
    }
}

fn bool_var(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "openai:gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            classifier_max_tokens: 64,
            validate_results: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("./.cache/dialectic"),
            ttl: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for LangbaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.langbase.com".to_string(),
            pipe: "dialectic-v1".to_string(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_tokens, 2000);
        assert!(!config.validate_results);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cache_defaults_never_expire() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert!(config.ttl.is_none());
        assert_eq!(config.directory, PathBuf::from("./.cache/dialectic"));
    }

    #[test]
    fn test_request_defaults() {
        let config = RequestConfig::default();
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_ms, 1000);
    }
}
