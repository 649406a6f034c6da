pub mod config;
pub mod doctor;
pub mod query;

use orderdesk_core::errors::InterfaceError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    /// Successful data command; `source` is `live` or `fallback`.
    pub fn data(
        command: &str,
        source: &str,
        correlation_id: Option<String>,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            source: Some(source.to_string()),
            correlation_id,
            error_class: None,
            message: message.into(),
            detail: None,
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            source: None,
            correlation_id: None,
            error_class: Some(error_class.to_string()),
            message: message.into(),
            detail: None,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure carrying the user-safe message; the raw error goes to `detail`.
    pub fn interface_failure(command: &str, error: &InterfaceError, exit_code: u8) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            source: None,
            correlation_id: Some(error.correlation_id().to_string()),
            error_class: Some(error.class().to_string()),
            message: error.user_message().to_string(),
            detail: Some(error.to_string()),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string_pretty(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\
             \"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
