use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use orderdesk_cli::commands::query::{self, QueryCommand};
use orderdesk_cli::commands::{config, doctor};
use orderdesk_core::config::LoadOptions;
use orderdesk_core::domain::paging::QueryParams;
use serde_json::Value;
use tempfile::TempDir;

const FAST_FALLBACK: (&str, &str) = ("ORDERDESK_FALLBACK_LATENCY_MS", "0");

#[test]
fn offline_customers_are_served_from_the_fallback_dataset() {
    with_env(&[FAST_FALLBACK], || {
        let params = QueryParams::page(1, 2).with_search("mexico");
        let result = query::run(QueryCommand::Customers(params), LoadOptions::default(), true);
        assert_eq!(result.exit_code, 0, "expected fallback success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "customers");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["source"], "fallback");
        assert_eq!(payload["data"]["totalCount"], 2);
        assert_eq!(payload["data"]["items"].as_array().map(Vec::len), Some(2));
        assert!(payload["correlation_id"].is_string());
    });
}

#[test]
fn offline_order_detail_reports_reconciled_totals() {
    with_env(&[FAST_FALLBACK], || {
        let result = query::run(QueryCommand::OrderDetail(10248), LoadOptions::default(), true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["source"], "fallback");
        assert_eq!(payload["data"]["customerName"], "Alfreds Futterkiste");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("total 266"), "unexpected message: {message}");
    });
}

#[test]
fn offline_customer_orders_filter_by_customer() {
    with_env(&[FAST_FALLBACK], || {
        let result = query::run(QueryCommand::CustomerOrders(2), LoadOptions::default(), true);
        let payload = parse_payload(&result.output);

        assert_eq!(payload["source"], "fallback");
        assert_eq!(payload["data"].as_array().map(Vec::len), Some(1));
        assert_eq!(payload["data"][0]["orderId"], 10250);
    });
}

#[test]
fn disabled_fallback_surfaces_transport_errors() {
    with_env(&[FAST_FALLBACK, ("ORDERDESK_FALLBACK_ENABLED", "false")], || {
        let params = QueryParams::default();
        let result = query::run(QueryCommand::Orders(params), LoadOptions::default(), true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "transport");
        assert_eq!(
            payload["message"],
            "The service is temporarily unavailable. Please retry shortly."
        );
        assert!(payload["correlation_id"].as_str().is_some_and(|id| id != "unassigned"));
        let detail = payload["detail"].as_str().unwrap_or_default();
        assert!(detail.starts_with("service unavailable: "), "{detail}");
    });
}

#[test]
fn invalid_config_is_reported_before_any_request() {
    with_env(&[("ORDERDESK_API_BASE_URL", "ftp://orders.example")], || {
        let result = query::run(
            QueryCommand::Predictions(QueryParams::default()),
            LoadOptions::default(),
            true,
        );
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "predictions");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_reports_sources_and_redacts_the_token() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("orderdesk.toml");
    fs::write(&path, "[api]\ntimeout_secs = 12\n\n[query]\ndefault_page_size = 25\n")
        .expect("write config");

    with_env(&[("ORDERDESK_API_BEARER_TOKEN", "eyJhbGciOiJIUzI1NiJ9.secret-part")], || {
        let options = LoadOptions { config_path: Some(path.clone()), ..LoadOptions::default() };
        let output = config::run(options);

        assert!(output.contains("- api.timeout_secs = 12 (source: file ("), "{output}");
        assert!(output.contains("- query.default_page_size = 25 (source: file ("), "{output}");
        assert!(output.contains("- api.base_url = https://localhost:7085 (source: default)"));
        assert!(output.contains(
            "- api.bearer_token = eyJh*** (source: env (ORDERDESK_API_BEARER_TOKEN))"
        ));
        assert!(!output.contains("secret-part"));
    });
}

#[test]
fn offline_doctor_passes_and_skips_the_backend_check() {
    with_env(&[], || {
        let output = doctor::run(LoadOptions::default(), true, true);
        let payload = parse_payload(&output);

        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().cloned().unwrap_or_default();
        let status_of = |name: &str| {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .map(|check| check["status"].clone())
                .unwrap_or(Value::Null)
        };
        assert_eq!(status_of("config_validation"), "pass");
        assert_eq!(status_of("fallback_dataset"), "pass");
        assert_eq!(status_of("backend_reachability"), "skipped");
    });
}

#[test]
fn doctor_fails_on_invalid_config() {
    with_env(&[("ORDERDESK_QUERY_DEFAULT_PAGE_SIZE", "0")], || {
        let output = doctor::run(LoadOptions::default(), true, false);

        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation:"));
        assert!(output.contains("- [skip] fallback_dataset:"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ORDERDESK_API_BASE_URL",
        "ORDERDESK_API_TIMEOUT_SECS",
        "ORDERDESK_API_BEARER_TOKEN",
        "ORDERDESK_FALLBACK_ENABLED",
        "ORDERDESK_FALLBACK_LATENCY_MS",
        "ORDERDESK_FALLBACK_PREDICTION_SEED",
        "ORDERDESK_QUERY_DEFAULT_PAGE_SIZE",
        "ORDERDESK_QUERY_SEARCH_DEBOUNCE_MS",
        "ORDERDESK_QUERY_DISCARD_STALE_RESULTS",
        "ORDERDESK_LOGGING_LEVEL",
        "ORDERDESK_LOGGING_FORMAT",
        "ORDERDESK_LOG_LEVEL",
        "ORDERDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
