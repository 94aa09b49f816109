use thiserror::Error;
use tracing_subscriber::prelude::*;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to initialize logger: {0}")]
    InitError(String),
}

/// Installs the global subscriber. Logs go to stderr; stdout carries command output.
pub fn init_logger(config: &crate::config::Config) -> Result<(), LoggerError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(config.log_level()))
        .map_err(|e| LoggerError::InitError(e.to_string()))?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_output() {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .try_init()
    };

    result.map_err(|e| LoggerError::InitError(e.to_string()))
}
