use orderdesk_client::{HttpTransport, Transport, TransportRequest};
use orderdesk_core::config::{AppConfig, LoadOptions};
use orderdesk_core::domain::customer::Customer;
use orderdesk_core::domain::order::Order;
use orderdesk_core::domain::prediction::SalesPrediction;
use orderdesk_core::domain::record::Record;
use orderdesk_fallback::{FallbackSimulator, SeedData, SimulatorSettings};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, offline: bool, json_output: bool) -> String {
    let report = build_report(options, offline);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\
                 \"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions, offline: bool) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_fallback_dataset(&config));
            checks.push(check_backend_reachability(&config, offline));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["fallback_dataset", "backend_reachability"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // A skipped check does not fail the report.
    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_fallback_dataset(config: &AppConfig) -> DoctorCheck {
    if !config.fallback.enabled {
        return DoctorCheck {
            name: "fallback_dataset",
            status: CheckStatus::Skipped,
            details: "fallback is disabled; transport failures will be reported".to_string(),
        };
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "fallback_dataset",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let settings = SimulatorSettings::from_config(&config.fallback, &config.query);
    let counts = runtime.block_on(async {
        [
            seeded_count::<Customer>(&settings).await,
            seeded_count::<Order>(&settings).await,
            seeded_count::<SalesPrediction>(&settings).await,
        ]
    });

    let details = counts
        .iter()
        .map(|(kind, count)| format!("{kind}={count}"))
        .collect::<Vec<_>>()
        .join(", ");
    let status = if counts.iter().all(|(_, count)| *count > 0) {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };

    DoctorCheck { name: "fallback_dataset", status, details: format!("seeded {details}") }
}

async fn seeded_count<T>(settings: &SimulatorSettings) -> (&'static str, usize)
where
    T: Record + SeedData,
{
    let simulator = FallbackSimulator::<T>::seeded(settings);
    (T::KIND.as_str(), simulator.dataset().len().await)
}

fn check_backend_reachability(config: &AppConfig, offline: bool) -> DoctorCheck {
    if offline {
        return DoctorCheck {
            name: "backend_reachability",
            status: CheckStatus::Skipped,
            details: "offline mode; every request is served by the fallback dataset".to_string(),
        };
    }

    let transport = match HttpTransport::new(&config.api) {
        Ok(transport) => transport,
        Err(error) => {
            return DoctorCheck {
                name: "backend_reachability",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "backend_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let request = TransportRequest::get("Customer")
        .with_query(vec![("PageSize".to_string(), "1".to_string())]);
    match runtime.block_on(transport.send(request)) {
        Ok(_) => DoctorCheck {
            name: "backend_reachability",
            status: CheckStatus::Pass,
            details: format!("reached `{}`", transport.base_url()),
        },
        Err(error) => DoctorCheck {
            name: "backend_reachability",
            status: CheckStatus::Fail,
            details: format!("`{}` unreachable: {error}", transport.base_url()),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
