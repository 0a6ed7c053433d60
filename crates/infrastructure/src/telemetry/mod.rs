//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured filter. Output is either
//! human-readable text or one JSON object per line.

use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ServerConfig, TelemetryConfig};

/// Errors from subscriber installation
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Anything other than `json` falls back to text
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

fn build_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(directive).map_err(|e| TelemetryError::Filter(e.to_string())),
    }
}

/// Install the global subscriber; call once at startup
pub fn init_tracing(
    server: &ServerConfig,
    telemetry: &TelemetryConfig,
) -> Result<LogFormat, TelemetryError> {
    let filter = build_filter(&telemetry.log_filter)?;
    let format = LogFormat::parse(&server.log_format);

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };
    result.map_err(|e| TelemetryError::Init(e.to_string()))?;

    info!(log_format = ?format, filter = %telemetry.log_filter, "Tracing initialized");
    Ok(format)
}
