use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use orderdesk_cli::Cli;
use orderdesk_core::config::{AppConfig, LogFormat};
use tracing::Level;

/// Logs go to stderr so command output on stdout stays parseable.
fn init_logging(config: &AppConfig) -> Result<()> {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Commands report configuration errors themselves.
    if let Ok(config) = AppConfig::load(cli.load_options()) {
        init_logging(&config)?;
    }

    Ok(orderdesk_cli::run(cli))
}
