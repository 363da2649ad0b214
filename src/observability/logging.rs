//! # Logging
//!
//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set. Otherwise the filter is built from `LOG_LEVEL`,
//! scoped to this crate and the kube runtime.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// `json` selects JSON lines, anything else plain text
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Default filter directive for a level such as `INFO` or `debug`
#[must_use]
pub fn default_directive(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    let level = match level.as_str() {
        "error" | "warn" | "info" | "debug" | "trace" => level,
        _ => "info".to_string(),
    };
    format!("s3_copy_controller={level},kube_runtime=warn")
}

/// Install the global subscriber
#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only when a global subscriber is already installed"
)]
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    };

    result.map_err(|e| anyhow!("Failed to initialize tracing subscriber: {e}"))
}
