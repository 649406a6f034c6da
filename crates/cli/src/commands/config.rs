use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use orderdesk_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct ConfigField {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run(options: LoadOptions) -> String {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<ConfigField> {
    let bearer_token = match &config.api.bearer_token {
        Some(token) => redact_token(token.expose_secret()),
        None => "<unset>".to_string(),
    };
    let prediction_seed = config
        .fallback
        .prediction_seed
        .map(|seed| seed.to_string())
        .unwrap_or_else(|| "<random>".to_string());

    vec![
        ConfigField {
            key: "api.base_url",
            env_keys: &["ORDERDESK_API_BASE_URL"],
            value: config.api.base_url.clone(),
        },
        ConfigField {
            key: "api.timeout_secs",
            env_keys: &["ORDERDESK_API_TIMEOUT_SECS"],
            value: config.api.timeout_secs.to_string(),
        },
        ConfigField {
            key: "api.bearer_token",
            env_keys: &["ORDERDESK_API_BEARER_TOKEN"],
            value: bearer_token,
        },
        ConfigField {
            key: "fallback.enabled",
            env_keys: &["ORDERDESK_FALLBACK_ENABLED"],
            value: config.fallback.enabled.to_string(),
        },
        ConfigField {
            key: "fallback.latency_ms",
            env_keys: &["ORDERDESK_FALLBACK_LATENCY_MS"],
            value: config.fallback.latency_ms.to_string(),
        },
        ConfigField {
            key: "fallback.prediction_seed",
            env_keys: &["ORDERDESK_FALLBACK_PREDICTION_SEED"],
            value: prediction_seed,
        },
        ConfigField {
            key: "query.default_page_size",
            env_keys: &["ORDERDESK_QUERY_DEFAULT_PAGE_SIZE"],
            value: config.query.default_page_size.to_string(),
        },
        ConfigField {
            key: "query.search_debounce_ms",
            env_keys: &["ORDERDESK_QUERY_SEARCH_DEBOUNCE_MS"],
            value: config.query.search_debounce_ms.to_string(),
        },
        ConfigField {
            key: "query.discard_stale_results",
            env_keys: &["ORDERDESK_QUERY_DISCARD_STALE_RESULTS"],
            value: config.query.discard_stale_results.to_string(),
        },
        ConfigField {
            key: "logging.level",
            env_keys: &["ORDERDESK_LOGGING_LEVEL", "ORDERDESK_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        ConfigField {
            key: "logging.format",
            env_keys: &["ORDERDESK_LOGGING_FORMAT", "ORDERDESK_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format).to_lowercase(),
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config file"));
            return format!("file ({})", file_path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Shows at most the first four characters of a token.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let visible: String = trimmed.chars().take(4).collect();
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }
    format!("{visible}***")
}
