use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["orderdesk.toml", "config/orderdesk.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub fallback: FallbackConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub bearer_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub latency_ms: u64,
    /// Fixed seed for the synthetic predictions; random when unset.
    pub prediction_seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct QueryConfig {
    pub default_page_size: u32,
    pub search_debounce_ms: u64,
    pub discard_stale_results: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub api_timeout_secs: Option<u64>,
    pub api_bearer_token: Option<String>,
    pub fallback_enabled: Option<bool>,
    pub fallback_latency_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://localhost:7085".to_string(),
                timeout_secs: 30,
                bearer_token: None,
            },
            fallback: FallbackConfig { enabled: true, latency_ms: 300, prediction_seed: None },
            query: QueryConfig {
                default_page_size: 10,
                search_debounce_ms: 400,
                discard_stale_results: false,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
            if let Some(bearer_token) = api.bearer_token {
                self.api.bearer_token = Some(secret_value(bearer_token));
            }
        }

        if let Some(fallback) = patch.fallback {
            if let Some(enabled) = fallback.enabled {
                self.fallback.enabled = enabled;
            }
            if let Some(latency_ms) = fallback.latency_ms {
                self.fallback.latency_ms = latency_ms;
            }
            if let Some(prediction_seed) = fallback.prediction_seed {
                self.fallback.prediction_seed = Some(prediction_seed);
            }
        }

        if let Some(query) = patch.query {
            if let Some(default_page_size) = query.default_page_size {
                self.query.default_page_size = default_page_size;
            }
            if let Some(search_debounce_ms) = query.search_debounce_ms {
                self.query.search_debounce_ms = search_debounce_ms;
            }
            if let Some(discard_stale_results) = query.discard_stale_results {
                self.query.discard_stale_results = discard_stale_results;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ORDERDESK_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = read_env("ORDERDESK_API_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_u64("ORDERDESK_API_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("ORDERDESK_API_BEARER_TOKEN") {
            self.api.bearer_token = Some(secret_value(value));
        }

        if let Some(value) = read_env("ORDERDESK_FALLBACK_ENABLED") {
            self.fallback.enabled = parse_bool("ORDERDESK_FALLBACK_ENABLED", &value)?;
        }
        if let Some(value) = read_env("ORDERDESK_FALLBACK_LATENCY_MS") {
            self.fallback.latency_ms = parse_u64("ORDERDESK_FALLBACK_LATENCY_MS", &value)?;
        }
        if let Some(value) = read_env("ORDERDESK_FALLBACK_PREDICTION_SEED") {
            self.fallback.prediction_seed =
                Some(parse_u64("ORDERDESK_FALLBACK_PREDICTION_SEED", &value)?);
        }

        if let Some(value) = read_env("ORDERDESK_QUERY_DEFAULT_PAGE_SIZE") {
            self.query.default_page_size =
                parse_u32("ORDERDESK_QUERY_DEFAULT_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env("ORDERDESK_QUERY_SEARCH_DEBOUNCE_MS") {
            self.query.search_debounce_ms =
                parse_u64("ORDERDESK_QUERY_SEARCH_DEBOUNCE_MS", &value)?;
        }
        if let Some(value) = read_env("ORDERDESK_QUERY_DISCARD_STALE_RESULTS") {
            self.query.discard_stale_results =
                parse_bool("ORDERDESK_QUERY_DISCARD_STALE_RESULTS", &value)?;
        }

        let log_level =
            read_env("ORDERDESK_LOGGING_LEVEL").or_else(|| read_env("ORDERDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ORDERDESK_LOGGING_FORMAT").or_else(|| read_env("ORDERDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.api_base_url {
            self.api.base_url = base_url;
        }
        if let Some(timeout_secs) = overrides.api_timeout_secs {
            self.api.timeout_secs = timeout_secs;
        }
        if let Some(bearer_token) = overrides.api_bearer_token {
            self.api.bearer_token = Some(secret_value(bearer_token));
        }
        if let Some(enabled) = overrides.fallback_enabled {
            self.fallback.enabled = enabled;
        }
        if let Some(latency_ms) = overrides.fallback_latency_ms {
            self.fallback.latency_ms = latency_ms;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api(&self.api)?;
        validate_fallback(&self.fallback)?;
        validate_query(&self.query)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    let base_url = api.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "api.base_url must start with http:// or https://".to_string(),
        ));
    }

    if api.timeout_secs == 0 || api.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "api.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let blank_token =
        api.bearer_token.as_ref().is_some_and(|token| token.expose_secret().trim().is_empty());
    if blank_token {
        return Err(ConfigError::Validation(
            "api.bearer_token must not be blank when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_fallback(fallback: &FallbackConfig) -> Result<(), ConfigError> {
    if fallback.latency_ms > 10_000 {
        return Err(ConfigError::Validation(
            "fallback.latency_ms must be at most 10000".to_string(),
        ));
    }

    Ok(())
}

fn validate_query(query: &QueryConfig) -> Result<(), ConfigError> {
    if query.default_page_size == 0 || query.default_page_size > 500 {
        return Err(ConfigError::Validation(
            "query.default_page_size must be in range 1..=500".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    fallback: Option<FallbackPatch>,
    query: Option<QueryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    bearer_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FallbackPatch {
    enabled: Option<bool>,
    latency_ms: Option<u64>,
    prediction_seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryPatch {
    default_page_size: Option<u32>,
    search_debounce_ms: Option<u64>,
    discard_stale_results: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
